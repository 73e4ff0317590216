use crate::domain::{DomainError, Fragment, FragmentFormat, RawFragment};

/// Turns raw fragment text into a validated [`Fragment`].
///
/// Decoding is all-or-nothing: any shape error yields
/// [`DomainError::MalformedFragment`] and no partial fragment.
pub trait FragmentDecoder: Send + Sync {
    fn format(&self) -> FragmentFormat;

    fn decode(&self, raw: &RawFragment) -> Result<Fragment, DomainError>;

    fn supports(&self, raw: &RawFragment) -> bool {
        raw.format() == self.format()
    }
}
