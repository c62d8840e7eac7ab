//! End-to-end scenarios on the friend-storage graph, plus bubbling and
//! membership-tracking properties.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use revtrack::prelude::*;
use revtrack_demo::{Address, Friend, FriendEmail, FriendWrapper};

fn count_flips(wrapper: &EntityWrapper<Friend>) -> (Rc<Cell<u32>>, Subscription) {
    let flips = Rc::new(Cell::new(0));
    let counter = Rc::clone(&flips);
    let sub = wrapper.subscribe(Topic::IsChanged, move |_| counter.set(counter.get() + 1));
    (flips, sub)
}

fn emails_of(friend: &FriendWrapper) -> Vec<String> {
    friend.with_model(|f| f.emails.iter().map(|e| e.borrow().email.clone()).collect())
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn edit_then_reject_a_single_field() {
    let address = EntityWrapper::from_entity(Address::new(1, "Berlin"));

    address.set("city", "Munich").unwrap();
    assert!(address.is_field_changed("city"));
    assert_eq!(address.original("city").unwrap(), Value::from("Berlin"));

    address.reject_changes();
    assert_eq!(address.get("city").unwrap(), Value::from("Berlin"));
    assert!(!address.is_changed());
}

#[test]
fn adding_an_email_satisfies_the_developer_rule() {
    let mut model = Friend::new(1, "", Address::new(1, "Berlin"));
    model.is_developer = true;
    let friend = FriendWrapper::from_friend(model).unwrap();

    let failures = friend.validation_failures();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().any(|f| f.message == "Firstname is required"));
    assert!(
        failures
            .iter()
            .any(|f| f.message == "A developer must have an email-address")
    );

    friend
        .emails()
        .add(EntityWrapper::from_entity(FriendEmail::new(1, "a@b.com")))
        .unwrap();
    let failures = friend.validation_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].fields, vec!["first_name"]);
    assert!(friend.is_changed());
}

#[test]
fn parent_accept_clears_nested_address() {
    let friend = FriendWrapper::from_friend(Friend::new(1, "Thomas", Address::new(1, "Berlin")))
        .unwrap();

    friend.address().set("street", "Main St").unwrap();
    assert!(friend.is_changed());

    friend.accept_changes();
    assert!(!friend.address().is_field_changed("street"));
    assert!(!friend.is_changed());
    assert_eq!(friend.address().get("street").unwrap(), Value::from("Main St"));
}

#[test]
fn backing_sequence_follows_tracker_edits() {
    let friend = FriendWrapper::from_friend(
        Friend::new(1, "Thomas", Address::new(1, "Berlin"))
            .with_email(FriendEmail::new(1, "a@x.org"))
            .with_email(FriendEmail::new(2, "b@x.org")),
    )
    .unwrap();

    friend
        .emails()
        .insert(0, EntityWrapper::from_entity(FriendEmail::new(3, "c@x.org")))
        .unwrap();
    friend.emails().remove_at(1);
    assert_eq!(emails_of(&friend), vec!["c@x.org", "b@x.org"]);

    friend.reject_changes();
    assert_eq!(emails_of(&friend), vec!["a@x.org", "b@x.org"]);
    assert!(!friend.is_changed());
}

#[test]
fn member_edit_bubbles_through_collection() {
    let friend = FriendWrapper::from_friend(
        Friend::new(1, "Thomas", Address::new(1, "Berlin"))
            .with_email(FriendEmail::new(1, "a@x.org")),
    )
    .unwrap();
    let (flips, _sub) = count_flips(&friend);

    let email = friend.emails().get(0).unwrap();
    email.assign(FriendEmail::COMMENT, Some("work".to_owned()));
    assert!(friend.is_changed());
    assert_eq!(flips.get(), 1);
    assert_eq!(friend.emails().modified_items().len(), 1);

    email.assign(FriendEmail::COMMENT, None);
    assert!(!friend.is_changed());
    assert_eq!(flips.get(), 2);
}

#[test]
fn refresh_follows_accept_and_reject() {
    let friend = FriendWrapper::from_friend(Friend::new(1, "Thomas", Address::new(1, "Berlin")))
        .unwrap();
    let refreshes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&refreshes);
    let _sub = friend.subscribe(Topic::Refresh, move |_| counter.set(counter.get() + 1));

    friend.reject_changes();
    friend.accept_changes();
    assert_eq!(refreshes.get(), 2);
}

#[test]
fn dirty_channel_tracks_the_pending_flag() {
    let friend = FriendWrapper::from_friend(Friend::new(1, "Thomas", Address::new(1, "Berlin")))
        .unwrap();
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    let _sub = friend.subscribe(Topic::Dirty("first_name"), move |_| {
        counter.set(counter.get() + 1);
    });

    friend.set_first_name("Julia".to_owned());
    friend.set_last_name(Some("Huber".to_owned()));
    friend.set_first_name("Thomas".to_owned());
    assert_eq!(seen.get(), 2);
}

// ── Bubbling ────────────────────────────────────────────────────────────

fn address_edit() -> impl Strategy<Value = (u8, String)> {
    (
        0u8..3,
        prop::sample::select(vec!["Berlin", "Munich", "Hamburg"]).prop_map(str::to_owned),
    )
}

proptest! {
    #[test]
    fn nested_edits_flip_parent_once(edits in prop::collection::vec(address_edit(), 1..12)) {
        let friend = FriendWrapper::from_friend(
            Friend::new(1, "Thomas", Address::new(1, "Berlin")),
        ).unwrap();
        let (flips, _sub) = count_flips(&friend);

        // Start with one edit that certainly changes something.
        friend.address().assign(Address::STREET, Some("Main St".to_owned()));
        for (which, text) in &edits {
            match which {
                0 => friend.address().assign(Address::CITY, text.clone()),
                1 => friend.address().assign(Address::STREET_NUMBER, Some(text.clone())),
                _ => friend.address().assign(Address::ID, 2),
            }
        }
        prop_assert!(friend.is_changed());
        prop_assert_eq!(flips.get(), 1);

        friend.reject_changes();
        prop_assert!(!friend.is_changed());
        prop_assert_eq!(flips.get(), 2);
        prop_assert_eq!(friend.address().value(Address::CITY), "Berlin");
    }
}

// ── Membership tracking ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Edit {
    Add,
    Insert(usize),
    RemoveAt(usize),
    MoveToEnd(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        Just(Edit::Add),
        (0usize..6).prop_map(Edit::Insert),
        (0usize..6).prop_map(Edit::RemoveAt),
        (0usize..6).prop_map(Edit::MoveToEnd),
    ]
}

proptest! {
    #[test]
    fn backing_mirrors_membership(
        initial in 0usize..4,
        edits in prop::collection::vec(edit_strategy(), 0..16),
    ) {
        let mut model = Friend::new(1, "Thomas", Address::new(1, "Berlin"));
        for i in 0..initial {
            model = model.with_email(FriendEmail::new(i as i32, &format!("m{i}@x.org")));
        }
        let friend = FriendWrapper::from_friend(model).unwrap();
        let baseline = friend.emails().items();
        let mut next_id = 100;

        for edit in &edits {
            let emails = friend.emails();
            match edit {
                Edit::Add => {
                    next_id += 1;
                    emails
                        .add(EntityWrapper::from_entity(FriendEmail::new(next_id, "n@x.org")))
                        .unwrap();
                }
                Edit::Insert(at) => {
                    next_id += 1;
                    emails
                        .insert(*at, EntityWrapper::from_entity(FriendEmail::new(next_id, "n@x.org")))
                        .unwrap();
                }
                Edit::RemoveAt(at) => {
                    emails.remove_at(*at);
                }
                Edit::MoveToEnd(at) => {
                    if let Some(moved) = emails.remove_at(*at) {
                        emails.add(moved).unwrap();
                    }
                }
            }

            let models = emails.models();
            let backing = friend.with_model(|f| f.emails.clone());
            prop_assert_eq!(backing.len(), models.len());
            for (b, m) in backing.iter().zip(&models) {
                prop_assert!(Rc::ptr_eq(b, m));
            }

            let items = emails.items();
            let same_members = items.len() == baseline.len()
                && items.iter().zip(&baseline).all(|(w, b)| b.ptr_eq(w));
            prop_assert_eq!(emails.is_changed(), !same_members);
            prop_assert_eq!(friend.is_changed(), !same_members);
        }

        friend.reject_changes();
        let restored = friend.emails().items();
        prop_assert_eq!(restored.len(), baseline.len());
        for (r, b) in restored.iter().zip(&baseline) {
            prop_assert!(r.ptr_eq(b));
        }
        prop_assert!(!friend.is_changed());
    }
}

proptest! {
    #[test]
    fn add_then_remove_is_unchanged(initial in 0usize..4) {
        let mut model = Friend::new(1, "Thomas", Address::new(1, "Berlin"));
        for i in 0..initial {
            model = model.with_email(FriendEmail::new(i as i32, "m@x.org"));
        }
        let friend = FriendWrapper::from_friend(model).unwrap();
        let extra = EntityWrapper::from_entity(FriendEmail::new(99, "w@x.org"));

        friend.emails().add(extra.clone()).unwrap();
        prop_assert!(friend.emails().is_changed());
        prop_assert!(friend.emails().remove(&extra));
        prop_assert!(!friend.emails().is_changed());
        prop_assert!(!friend.is_changed());
        prop_assert_eq!(friend.with_model(|f| f.emails.len()), initial);
    }
}
