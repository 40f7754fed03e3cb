//! # Suite Module
//!
//! The pet-store case set.
//!
//! Every case is a self-contained linear script: build a pet with a fresh
//! random id, issue its calls one after another, assert on status and body
//! and delete what it created. Cases share nothing but the remote service.
//!
//! | TestId | kind     | scenario                                            |
//! |--------|----------|-----------------------------------------------------|
//! | 1001   | positive | create, read back, delete                           |
//! | 1002   | positive | `findByStatus?status=available` has an available pet |
//! | 1003   | positive | create, full replace with a new name, verify, delete |
//! | 1004   | positive | create, form update name and status, verify, delete |
//! | 1005   | positive | create, delete                                      |
//! | 1006   | positive | create, multipart image upload, delete              |
//! | 2001   | negative | create with id `"#"` is rejected                    |
//! | 2002   | negative | read of a never-created id is `404`                 |
//! | 2003   | negative | second delete of the same pet is `404`              |
//!
//! Creating cases go through [`crate::lease::with_created_pet`], which deletes
//! the pet on every exit path.

mod case;
mod pets;

pub use case::{Case, CaseContext, CaseFn, CaseKind, CaseMode};
pub use pets::{FORM_RENAMED, RENAMED};

/// The full case set in declaration order.
pub fn pet_cases() -> Vec<Case> {
    pets::cases()
}
