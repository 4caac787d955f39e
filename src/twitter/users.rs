//! User lookup.

use crate::request::{RequestDescriptor, ResponseShape};

use super::types::UserRef;

/// `GET users/show`
pub fn show(user: &UserRef) -> RequestDescriptor {
    let (name, value) = user.as_param();
    RequestDescriptor::get("users/show.json")
        .required(name, value)
        .build()
}

/// `GET users/lookup` for a batch of ids.
///
/// Each id is bound as its own `user_id` parameter, in the order given.
pub fn lookup(user_ids: &[u64]) -> RequestDescriptor {
    RequestDescriptor::get("users/lookup.json")
        .repeated("user_id", user_ids)
        .shape(ResponseShape::List)
        .build()
}
