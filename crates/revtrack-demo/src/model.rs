//! Plain entities of the friend-storage domain.

use revtrack::{Entity, Shared, ValidationFailure};

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct Address {
    pub id: i32,
    #[track(required = "City is required")]
    pub city: String,
    pub street: Option<String>,
    pub street_number: Option<String>,
}

impl Address {
    #[must_use]
    pub fn new(id: i32, city: &str) -> Self {
        Self {
            id,
            city: city.to_owned(),
            street: None,
            street_number: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Entity)]
pub struct FriendEmail {
    pub id: i32,
    #[track(required = "Email is required")]
    #[track(email = "Email is not a valid email address")]
    pub email: String,
    pub comment: Option<String>,
}

impl FriendEmail {
    #[must_use]
    pub fn new(id: i32, email: &str) -> Self {
        Self {
            id,
            email: email.to_owned(),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Entity)]
#[track(validate = "friend_rules")]
pub struct Friend {
    pub id: i32,
    pub friend_group_id: i32,
    #[track(required = "Firstname is required")]
    pub first_name: String,
    pub last_name: Option<String>,
    /// ISO-8601 date.
    pub birthday: Option<String>,
    pub is_developer: bool,
    #[track(skip)]
    pub address: Option<Shared<Address>>,
    #[track(skip)]
    pub emails: Vec<Shared<FriendEmail>>,
}

impl Friend {
    #[must_use]
    pub fn new(id: i32, first_name: &str, address: Address) -> Self {
        Self {
            id,
            friend_group_id: 0,
            first_name: first_name.to_owned(),
            last_name: None,
            birthday: None,
            is_developer: false,
            address: Some(revtrack::shared(address)),
            emails: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: FriendEmail) -> Self {
        self.emails.push(revtrack::shared(email));
        self
    }
}

/// Cross-field rule: a developer must be reachable by email.
pub fn friend_rules(friend: &Friend, failures: &mut Vec<ValidationFailure>) {
    if friend.is_developer && friend.emails.is_empty() {
        failures.push(ValidationFailure::spanning(
            &["is_developer", "emails"],
            "A developer must have an email-address",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_requires_city() {
        let failures = Address::new(1, " ").validate();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "City is required");
    }

    #[test]
    fn email_checks_presence_then_format() {
        let messages = |email: &str| -> Vec<String> {
            FriendEmail::new(1, email)
                .validate()
                .into_iter()
                .map(|f| f.message)
                .collect()
        };
        assert_eq!(messages(""), vec!["Email is required".to_owned()]);
        assert_eq!(
            messages("thomas"),
            vec!["Email is not a valid email address".to_owned()]
        );
        assert!(messages("thomas@example.org").is_empty());
    }

    #[test]
    fn developer_needs_an_email() {
        let mut friend = Friend::new(1, "Thomas", Address::new(1, "Müllheim"));
        friend.is_developer = true;
        let failures = friend.validate();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].concerns("emails"));

        let friend = friend.with_email(FriendEmail::new(1, "thomas@example.org"));
        assert!(friend.validate().is_empty());
    }

    #[test]
    fn nested_fields_are_not_in_the_table() {
        assert!(!<Friend as Entity>::FIELDS.contains(&"address"));
        assert!(!<Friend as Entity>::FIELDS.contains(&"emails"));
        assert_eq!(<Friend as Entity>::FIELDS.len(), 6);
    }
}
