//! Hand-written entities for unit tests. The derive macro lives in another
//! crate, so these spell the accessor table out the way it expands.

use crate::entity::{Entity, Field, Shared};
use crate::error::TrackError;
use crate::validation::{self, ValidationFailure};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: i64,
    pub city: String,
    pub street: Option<String>,
}

impl Address {
    pub const ID: Field<Self, i64> = Field::new("id", |e: &Self| e.id, |e: &mut Self, v| e.id = v);
    pub const CITY: Field<Self, String> =
        Field::new("city", |e: &Self| e.city.clone(), |e: &mut Self, v| e.city = v);
    pub const STREET: Field<Self, Option<String>> =
        Field::new("street", |e: &Self| e.street.clone(), |e: &mut Self, v| e.street = v);

    pub fn new(id: i64, city: &str) -> Self {
        Self {
            id,
            city: city.to_owned(),
            street: None,
        }
    }
}

impl Entity for Address {
    const NAME: &'static str = "Address";
    const FIELDS: &'static [&'static str] = &["id", "city", "street"];

    fn read_field(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::from(self.id)),
            "city" => Some(Value::from(self.city.clone())),
            "street" => Some(Value::from(self.street.clone())),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: Value) -> Result<(), TrackError> {
        match field {
            "id" => {
                self.id = i64::try_from(value)
                    .map_err(|e| TrackError::type_mismatch(Self::NAME, "id", e))?;
            }
            "city" => {
                self.city = String::try_from(value)
                    .map_err(|e| TrackError::type_mismatch(Self::NAME, "city", e))?;
            }
            "street" => {
                self.street = Option::<String>::try_from(value)
                    .map_err(|e| TrackError::type_mismatch(Self::NAME, "street", e))?;
            }
            _ => return Err(TrackError::field_not_found(Self::NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        if !validation::required(&self.city) {
            failures.push(ValidationFailure::new("city", "City is required"));
        }
        failures
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub email: String,
}

impl Email {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_owned(),
        }
    }
}

impl Entity for Email {
    const NAME: &'static str = "Email";
    const FIELDS: &'static [&'static str] = &["email"];

    fn read_field(&self, field: &str) -> Option<Value> {
        match field {
            "email" => Some(Value::from(self.email.clone())),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: Value) -> Result<(), TrackError> {
        match field {
            "email" => {
                self.email = String::try_from(value)
                    .map_err(|e| TrackError::type_mismatch(Self::NAME, "email", e))?;
                Ok(())
            }
            _ => Err(TrackError::field_not_found(Self::NAME, field)),
        }
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        if validation::email(&self.email) {
            Vec::new()
        } else {
            vec![ValidationFailure::new("email", "Email is not a valid email address")]
        }
    }
}

/// An entity with one nested object and two nested collections, one of which
/// may be absent.
#[derive(Debug, Clone)]
pub struct Person {
    pub name: String,
    pub address: Option<Shared<Address>>,
    pub emails: Vec<Shared<Email>>,
    pub aliases: Option<Vec<Shared<Email>>>,
}

impl Person {
    pub fn new(name: &str, address: Option<Shared<Address>>) -> Self {
        Self {
            name: name.to_owned(),
            address,
            emails: Vec::new(),
            aliases: Some(Vec::new()),
        }
    }
}

impl Entity for Person {
    const NAME: &'static str = "Person";
    const FIELDS: &'static [&'static str] = &["name"];

    fn read_field(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::from(self.name.clone())),
            _ => None,
        }
    }

    fn write_field(&mut self, field: &str, value: Value) -> Result<(), TrackError> {
        match field {
            "name" => {
                self.name = String::try_from(value)
                    .map_err(|e| TrackError::type_mismatch(Self::NAME, "name", e))?;
                Ok(())
            }
            _ => Err(TrackError::field_not_found(Self::NAME, field)),
        }
    }
}

/// A single float field, for conversions and NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub ratio: f64,
}

impl Gauge {
    pub const RATIO: Field<Self, f64> =
        Field::new("ratio", |e: &Self| e.ratio, |e: &mut Self, v| e.ratio = v);
}

impl Entity for Gauge {
    const NAME: &'static str = "Gauge";
    const FIELDS: &'static [&'static str] = &["ratio"];

    fn read_field(&self, field: &str) -> Option<Value> {
        (field == "ratio").then(|| Value::from(self.ratio))
    }

    fn write_field(&mut self, field: &str, value: Value) -> Result<(), TrackError> {
        if field != "ratio" {
            return Err(TrackError::field_not_found(Self::NAME, field));
        }
        self.ratio =
            f64::try_from(value).map_err(|e| TrackError::type_mismatch(Self::NAME, "ratio", e))?;
        Ok(())
    }
}
