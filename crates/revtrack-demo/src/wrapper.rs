//! Typed wrappers over the friend-storage entities.

use std::ops::Deref;

use revtrack::{CollectionTracker, EntityWrapper, Result, Shared, shared};

use crate::model::{Address, Friend, FriendEmail};

pub type AddressWrapper = EntityWrapper<Address>;
pub type FriendEmailWrapper = EntityWrapper<FriendEmail>;

/// Value, original value and pending flag for one field, typed.
macro_rules! typed_field {
    ($field:ident, $setter:ident, $original:ident, $changed:ident, $konst:ident: $ty:ty) => {
        #[must_use]
        pub fn $field(&self) -> $ty {
            self.wrapper.value(Friend::$konst)
        }

        pub fn $setter(&self, value: $ty) {
            self.wrapper.assign(Friend::$konst, value);
        }

        #[must_use]
        pub fn $original(&self) -> $ty {
            self.wrapper.original_value(Friend::$konst)
        }

        #[must_use]
        pub fn $changed(&self) -> bool {
            self.wrapper.is_changed_field(Friend::$konst)
        }
    };
}

/// A friend with its address and email addresses tracked as one graph.
///
/// Dereferences to the underlying [`EntityWrapper<Friend>`] for by-name
/// access, accept/reject, and notification.
#[derive(Debug, Clone)]
pub struct FriendWrapper {
    wrapper: EntityWrapper<Friend>,
    address: AddressWrapper,
    emails: CollectionTracker<FriendEmail>,
}

impl FriendWrapper {
    /// Wrap `model`, its address and its emails.
    ///
    /// Fails with `MissingNestedData` when the friend has no address.
    pub fn new(model: Shared<Friend>) -> Result<Self> {
        let wrapper = EntityWrapper::new(model);
        let address = wrapper.track_complex("address", |friend| friend.address.clone())?;
        let emails = wrapper.track_collection("emails", |friend| Some(&mut friend.emails))?;
        Ok(Self {
            wrapper,
            address,
            emails,
        })
    }

    pub fn from_friend(friend: Friend) -> Result<Self> {
        Self::new(shared(friend))
    }

    #[must_use]
    pub fn address(&self) -> &AddressWrapper {
        &self.address
    }

    #[must_use]
    pub fn emails(&self) -> &CollectionTracker<FriendEmail> {
        &self.emails
    }

    typed_field!(id, set_id, id_original, id_is_changed, ID: i32);
    typed_field!(
        friend_group_id,
        set_friend_group_id,
        friend_group_id_original,
        friend_group_id_is_changed,
        FRIEND_GROUP_ID: i32
    );
    typed_field!(
        first_name,
        set_first_name,
        first_name_original,
        first_name_is_changed,
        FIRST_NAME: String
    );
    typed_field!(
        last_name,
        set_last_name,
        last_name_original,
        last_name_is_changed,
        LAST_NAME: Option<String>
    );
    typed_field!(
        birthday,
        set_birthday,
        birthday_original,
        birthday_is_changed,
        BIRTHDAY: Option<String>
    );
    typed_field!(
        is_developer,
        set_is_developer,
        is_developer_original,
        is_developer_is_changed,
        IS_DEVELOPER: bool
    );
}

impl Deref for FriendWrapper {
    type Target = EntityWrapper<Friend>;

    fn deref(&self) -> &Self::Target {
        &self.wrapper
    }
}
