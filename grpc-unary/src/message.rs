//! The message codec boundary.
//!
//! Stubs pass request and response messages to the pipeline as trait
//! objects so interceptors can see them without knowing their concrete
//! types.

use crate::transport::BoxError;

/// A protobuf message the pipeline can marshal and unmarshal.
pub trait Message: Send + Sync {
    /// Append the wire encoding of `self` to `buf`.
    fn marshal(&self, buf: &mut Vec<u8>) -> Result<(), BoxError>;

    /// Replace the contents of `self` with the message decoded from `buf`.
    fn unmarshal(&mut self, buf: &[u8]) -> Result<(), BoxError>;
}

#[cfg(feature = "prost")]
impl<T> Message for T
where
    T: prost::Message + Default + Send + Sync,
{
    fn marshal(&self, buf: &mut Vec<u8>) -> Result<(), BoxError> {
        prost::Message::encode(self, buf)?;
        Ok(())
    }

    fn unmarshal(&mut self, buf: &[u8]) -> Result<(), BoxError> {
        prost::Message::clear(self);
        prost::Message::merge(self, buf)?;
        Ok(())
    }
}
