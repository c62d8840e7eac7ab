use syn::{Attribute, Field, Ident, LitStr, Path, Result};

/// Struct-level `#[track(..)]` options.
#[derive(Default)]
pub struct EntityAttrs {
    pub name: Option<LitStr>,
    pub validate: Option<Path>,
}

impl EntityAttrs {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("track")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    out.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("validate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.validate = Some(lit.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `validate`"))
                }
            })?;
        }
        Ok(out)
    }
}

/// Built-in rule attached to a field.
pub enum Rule {
    Required(LitStr),
    Email(LitStr),
}

/// One named field and its `#[track(..)]` options.
pub struct TrackedField<'a> {
    pub field: &'a Field,
    pub ident: &'a Ident,
    pub skip: bool,
    pub rules: Vec<Rule>,
}

impl<'a> TrackedField<'a> {
    pub fn parse(field: &'a Field, ident: &'a Ident) -> Result<Self> {
        let mut out = Self {
            field,
            ident,
            skip: false,
            rules: Vec::new(),
        };
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("track")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.skip = true;
                    Ok(())
                } else if meta.path.is_ident("required") {
                    out.rules.push(Rule::Required(meta.value()?.parse()?));
                    Ok(())
                } else if meta.path.is_ident("email") {
                    out.rules.push(Rule::Email(meta.value()?.parse()?));
                    Ok(())
                } else {
                    Err(meta.error("expected `skip`, `required` or `email`"))
                }
            })?;
        }
        Ok(out)
    }

    /// Field name as written, without a raw-identifier prefix.
    pub fn name(&self) -> String {
        let raw = self.ident.to_string();
        raw.strip_prefix("r#").map_or_else(|| raw.clone(), str::to_owned)
    }
}
