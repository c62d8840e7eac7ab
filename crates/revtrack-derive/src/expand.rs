use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Error, Fields};

use crate::attrs::{EntityAttrs, Rule, TrackedField};

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let attrs = EntityAttrs::parse(&input.attrs)?;

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        fields.push(TrackedField::parse(field, field_ident)?);
    }
    let tracked: Vec<&TrackedField<'_>> = fields.iter().filter(|f| !f.skip).collect();

    let entity_name = attrs
        .name
        .as_ref()
        .map_or_else(|| ident.to_string(), syn::LitStr::value);
    let names: Vec<String> = tracked.iter().map(|f| f.name()).collect();

    let read_arms = tracked.iter().zip(&names).map(|(field, name)| {
        let field_ident = field.ident;
        quote! {
            #name => ::core::option::Option::Some(::revtrack::Value::from(
                ::core::clone::Clone::clone(&self.#field_ident),
            )),
        }
    });

    let write_arms = tracked.iter().zip(&names).map(|(field, name)| {
        let field_ident = field.ident;
        let ty = &field.field.ty;
        quote! {
            #name => {
                self.#field_ident = <#ty as ::core::convert::TryFrom<::revtrack::Value>>::try_from(
                    value,
                )
                .map_err(|err| {
                    ::revtrack::TrackError::type_mismatch(
                        <Self as ::revtrack::Entity>::NAME,
                        #name,
                        err,
                    )
                })?;
            }
        }
    });

    let rule_checks = fields.iter().flat_map(|field| {
        let field_ident = field.ident;
        let name = field.name();
        field.rules.iter().map(move |rule| {
            let (check, message) = match rule {
                Rule::Required(message) => (quote!(required), message),
                Rule::Email(message) => (quote!(email), message),
            };
            quote! {
                if !::revtrack::validation::#check(&self.#field_ident) {
                    failures.push(::revtrack::ValidationFailure::new(#name, #message));
                }
            }
        })
    });
    let custom_rule = attrs.validate.as_ref().map(|path| {
        quote! { #path(self, &mut failures); }
    });

    let accessors = tracked.iter().zip(&names).map(|(field, name)| {
        let field_ident = field.ident;
        let ty = &field.field.ty;
        let const_ident = format_ident!("{}", name.to_uppercase(), span = field_ident.span());
        let doc = format!("Typed accessor for `{name}`.");
        quote! {
            #[doc = #doc]
            pub const #const_ident: ::revtrack::Field<Self, #ty> = ::revtrack::Field::new(
                #name,
                |entity: &Self| ::core::clone::Clone::clone(&entity.#field_ident),
                |entity: &mut Self, value| entity.#field_ident = value,
            );
        }
    });

    Ok(quote! {
        impl #impl_generics ::revtrack::Entity for #ident #ty_generics #where_clause {
            const NAME: &'static str = #entity_name;
            const FIELDS: &'static [&'static str] = &[#(#names),*];

            fn read_field(&self, field: &str) -> ::core::option::Option<::revtrack::Value> {
                match field {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unreachable_code, unused_variables)]
            fn write_field(
                &mut self,
                field: &str,
                value: ::revtrack::Value,
            ) -> ::core::result::Result<(), ::revtrack::TrackError> {
                match field {
                    #(#write_arms)*
                    _ => {
                        return ::core::result::Result::Err(::revtrack::TrackError::field_not_found(
                            <Self as ::revtrack::Entity>::NAME,
                            field,
                        ));
                    }
                }
                ::core::result::Result::Ok(())
            }

            fn validate(&self) -> ::std::vec::Vec<::revtrack::ValidationFailure> {
                #[allow(unused_mut)]
                let mut failures = ::std::vec::Vec::new();
                #(#rule_checks)*
                #custom_rule
                failures
            }
        }

        impl #impl_generics #ident #ty_generics #where_clause {
            #(#accessors)*
        }
    })
}
