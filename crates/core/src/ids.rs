// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes shared across every crate in the workspace.
//!
//! Most IDs in this system are assigned externally — an org ID and run ID
//! come from the trigger that kicked off a run, a step ID comes from the
//! playbook. [`define_id!`] wraps a [`smol_str::SmolStr`] so these values are
//! cheap to clone and compare without losing the type distinction between,
//! say, a [`RunId`] and a [`StepId`].

use smol_str::SmolStr;

/// Define a newtype ID wrapper around `SmolStr`.
///
/// Generates `new()`/`from_string()` constructors, `as_str()`, `Display`,
/// `From<&str>`/`From<String>`, `Borrow<str>`, and `Deref<Target = str>` —
/// the same surface a `HashMap<IdType, _>` or `&str` comparison needs.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(smol_str::SmolStr::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

define_id! {
    /// `{org}` segment of every document-store path.
    pub struct OrgId;
}

define_id! {
    /// `{run}` segment — one concrete execution of a playbook.
    pub struct RunId;
}

define_id! {
    /// A step's ID within its playbook, e.g. `"account-provisioning"`.
    pub struct StepId;
}

define_id! {
    /// Auto-assigned document ID for an append-only event.
    pub struct EventId;
}

define_id! {
    /// Auto-assigned document ID for a user input document.
    pub struct InputId;
}

define_id! {
    /// Auto-assigned document ID for an uploaded-file record.
    pub struct FileId;
}

/// Generate a fresh UUID-v4 string for `questionId`/`approvalId`/
/// `RESUME_THREAD_ID` correlation values.
///
/// These are not [`define_id!`] newtypes because they cross the worker/store
/// boundary as plain strings compared for equality against whatever the
/// external document store handed back — see `pb_worker::hitl`.
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
