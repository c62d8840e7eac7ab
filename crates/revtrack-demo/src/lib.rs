#![forbid(unsafe_code)]

//! Friend-storage domain on top of revtrack: a friend with one address and a
//! list of email addresses, their typed wrappers, and a narrated walkthrough.

pub mod cli;
pub mod model;
pub mod walkthrough;
pub mod wrapper;

pub use model::{Address, Friend, FriendEmail, friend_rules};
pub use wrapper::{AddressWrapper, FriendEmailWrapper, FriendWrapper};
