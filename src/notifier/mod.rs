// Report delivery over email.

mod email;

pub use email::EmailNotifier;
