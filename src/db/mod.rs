mod connection;
mod cursor;
mod descriptor;

pub use connection::*;
pub use cursor::*;
pub use descriptor::*;

/// A single column value as the driver returned it. Typing is never
/// interpreted, so anything that is not NULL is an opaque payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Bytes(Vec<u8>),
}

impl Value {
    #[cfg(test)]
    pub fn text(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

/// Values aligned positionally with the cursor's column list.
pub type Row = Vec<Value>;
