//! Integration tests driving the booking engine end to end over the
//! in-memory store.

mod helpers;

mod update_scopes;
