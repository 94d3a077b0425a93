use crate::artifacts::objects::digest::Digest;
use anyhow::Result;
use bytes::Bytes;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(bytes: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn display(&self) -> String;

    // the digest of the serialized form is the object's key in the store
    fn object_id(&self) -> Result<Digest> {
        Ok(Digest::of(self.serialize()?))
    }
}
