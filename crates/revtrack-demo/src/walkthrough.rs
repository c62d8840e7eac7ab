//! Narrated scenarios over the friend-storage graph.
//!
//! Each scenario logs what it does at `info` and returns the first tracking
//! error it hits.

use std::cell::Cell;
use std::rc::Rc;

use revtrack::{EntityWrapper, Result, Topic};
use tracing::info;

use crate::cli::Scenario;
use crate::model::{Address, Friend, FriendEmail};
use crate::wrapper::FriendWrapper;

/// The friend every scenario starts from.
#[must_use]
pub fn sample_friend() -> Friend {
    let mut address = Address::new(1, "Müllheim");
    address.street = Some("Elmstreet".to_owned());
    address.street_number = Some("17".to_owned());
    let mut friend = Friend::new(1, "Thomas", address)
        .with_email(FriendEmail::new(1, "thomas@example.org"))
        .with_email(FriendEmail::new(2, "thomas@work.example.org"));
    friend.last_name = Some("Huber".to_owned());
    friend.is_developer = true;
    friend
}

pub fn run(scenario: Scenario) -> Result<()> {
    for step in scenario.expand() {
        info!(scenario = %step, "running scenario");
        match step {
            Scenario::Basic => basic()?,
            Scenario::Nested => nested()?,
            Scenario::Collection => collection()?,
            Scenario::All => {}
        }
    }
    Ok(())
}

/// Edit a field, look at its original, set it back, then edit and reject.
pub fn basic() -> Result<()> {
    let friend = FriendWrapper::from_friend(sample_friend())?;

    friend.set_first_name("Julia".to_owned());
    info!(
        first_name = %friend.first_name(),
        original = %friend.first_name_original(),
        changed = friend.is_changed(),
        "edited first name"
    );

    friend.set_first_name("Thomas".to_owned());
    info!(changed = friend.is_changed(), "set back to the original");

    friend.set("last_name", "Brezina")?;
    friend.reject_changes();
    info!(
        last_name = ?friend.last_name(),
        changed = friend.is_changed(),
        "rejected"
    );
    Ok(())
}

/// Edit the nested address and count the friend's `IsChanged` flips.
pub fn nested() -> Result<()> {
    let friend = FriendWrapper::from_friend(sample_friend())?;
    let flips = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&flips);
    let _sub = friend.subscribe(Topic::IsChanged, move |_| counter.set(counter.get() + 1));

    friend.address().assign(Address::CITY, "Freiburg".to_owned());
    friend.address().assign(Address::STREET_NUMBER, Some("3".to_owned()));
    info!(
        friend_changed = friend.is_changed(),
        city_changed = friend.address().is_changed_field(Address::CITY),
        flips = flips.get(),
        "edited the address twice"
    );

    friend.reject_changes();
    info!(
        city = %friend.address().value(Address::CITY),
        friend_changed = friend.is_changed(),
        flips = flips.get(),
        "rejected through the friend"
    );
    Ok(())
}

/// Add and remove emails, show the change sets, then reject.
pub fn collection() -> Result<()> {
    let friend = FriendWrapper::from_friend(sample_friend())?;
    let emails = friend.emails();

    emails.add(EntityWrapper::from_entity(FriendEmail::new(3, "thomas@home.example.org")))?;
    emails.remove_at(0);
    info!(
        added = emails.added_items().len(),
        removed = emails.removed_items().len(),
        backing = friend.with_model(|f| f.emails.len()),
        changed = friend.is_changed(),
        "edited emails"
    );

    emails.remove_at(0);
    emails.remove_at(0);
    info!(
        valid = friend.is_valid(),
        errors = ?friend.errors_for("emails"),
        "removed every email from a developer"
    );

    friend.reject_changes();
    info!(
        len = emails.len(),
        changed = friend.is_changed(),
        valid = friend.is_valid(),
        "rejected"
    );
    Ok(())
}
