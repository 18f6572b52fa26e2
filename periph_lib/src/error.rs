//! Error classification shared by the peripheral drivers.
//!
//! Each driver has its own error enum, but every variant falls into one of
//! the [`ErrorKind`] classes so that higher level code can react to, for
//! example, any transport failure without matching on every driver's enum.

/// Broad class of a driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bus transfer itself failed.
    Transport,

    /// The driver was used in a way its configuration does not allow, for
    /// example driving a channel which was never initialised.
    Configuration,

    /// A numeric argument was outside its documented bounds.
    Range,

    /// A value of the wrong kind was given, for example a number to an
    /// on/off channel.
    Type,
}
