//! Pre-queue validation: extension allow-list and size ceiling.
//!
//! Admission is all-or-nothing per committed batch. Any rejection discards
//! the whole selection and the queue is never touched.

use crate::errors::ValidationFailure;
use crate::upload::item::Selection;

/// Validation policy derived from the instance options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy<'a> {
    /// Comma-separated extension allow-list, matched case-insensitively
    /// against the trailing filename suffix.
    pub accept_types: Option<&'a str>,
    /// Ceiling in megabytes; compared against the reported byte length.
    pub max_file_size_mb: Option<u64>,
}

/// Outcome of checking one committed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Reject(ValidationFailure),
}

fn extension_allowed(name: &str, allow_list: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    allow_list
        .split(',')
        .map(str::trim)
        .any(|allowed| !allowed.is_empty() && allowed.eq_ignore_ascii_case(ext))
}

/// Check a selection against the policy.
///
/// Unconfigured policy is a pass-through. Extension rejections take
/// precedence: a batch with a wrong-type file is reported as such and size
/// checks never run for it. Path-only selections carry no metadata, so the
/// size check is skipped and the extension check inspects the single
/// textual path.
pub fn check(selection: &Selection, policy: &Policy<'_>) -> Verdict {
    let mut failure = ValidationFailure::default();

    if let Some(allow_list) = policy.accept_types {
        match selection {
            Selection::Files(files) => {
                for file in files {
                    if !extension_allowed(&file.name, allow_list) {
                        failure.wrong_type.push(file.name.clone());
                    }
                }
            }
            Selection::PathOnly(path) => {
                if !extension_allowed(path, allow_list) {
                    failure.wrong_type.push(path.clone());
                }
            }
        }
        if !failure.wrong_type.is_empty() {
            return Verdict::Reject(failure);
        }
    }

    if let Some(ceiling_mb) = policy.max_file_size_mb {
        if let Selection::Files(files) = selection {
            let ceiling = ceiling_mb * 1024 * 1024;
            for file in files {
                if file.size > ceiling {
                    failure.oversize.push(file.name.clone());
                }
            }
        }
        if !failure.oversize.is_empty() {
            return Verdict::Reject(failure);
        }
    }

    Verdict::Admit
}
