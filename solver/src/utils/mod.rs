//! Small formatting helpers shared by `Display` impls across the crate.

use std::fmt::{Display, Error, Formatter};

/// Writes `iterable`'s elements separated by `sep`, with no trailing separator.
pub fn disp_iter<T: Display>(f: &mut Formatter<'_>, iterable: &[T], sep: &str) -> Result<(), Error> {
    let mut i = iterable.iter();
    if let Some(first) = i.next() {
        write!(f, "{first}")?;
        for other in i {
            write!(f, "{sep}{other}")?;
        }
    }
    Ok(())
}
