//! Read and write concern types.

#[cfg(test)]
mod test;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;

use crate::error::{Error, ErrorKind, Result};

/// The consistency and isolation level requested from the server for a read operation.
///
/// See [the read concern levels](https://docs.mongodb.com/manual/reference/read-concern/) for
/// more information.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadConcern {
    Local,
    Available,
    Majority,
    Linearizable,
    Snapshot,
}

impl ReadConcern {
    /// Parses a read concern from its wire-level string, rejecting anything the server does not
    /// recognize (`InvalidConcern`) rather than forwarding an arbitrary level.
    pub fn from_level(level: &str) -> Result<Self> {
        match level {
            "local" => Ok(ReadConcern::Local),
            "available" => Ok(ReadConcern::Available),
            "majority" => Ok(ReadConcern::Majority),
            "linearizable" => Ok(ReadConcern::Linearizable),
            "snapshot" => Ok(ReadConcern::Snapshot),
            other => Err(Error::new(ErrorKind::InvalidConcern {
                message: format!("unrecognized read concern level: {other}"),
            })),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadConcern::Local => "local",
            ReadConcern::Available => "available",
            ReadConcern::Majority => "majority",
            ReadConcern::Linearizable => "linearizable",
            ReadConcern::Snapshot => "snapshot",
        }
    }
}

impl Serialize for ReadConcern {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bson::doc! { "level": self.as_str() }.serialize(serializer)
    }
}

/// The acknowledgement level requested from the server for a write operation.
///
/// See [the write concern reference](https://docs.mongodb.com/manual/reference/write-concern/)
/// for more information.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, typed_builder::TypedBuilder)]
pub struct WriteConcern {
    #[builder(default)]
    pub w: Option<Acknowledgment>,
    #[builder(default)]
    #[serde(rename = "wtimeout")]
    pub w_timeout_ms: Option<u64>,
    #[builder(default)]
    #[serde(rename = "j")]
    pub journal: Option<bool>,
}

impl WriteConcern {
    /// Rejects `w=0` combined with `j=true`, a negative `w`, and a negative timeout — the same
    /// invalid combinations the server rejects.
    pub fn validate(&self) -> Result<()> {
        if let Some(Acknowledgment::Nodes(n)) = self.w {
            if n < 0 {
                return Err(Error::new(ErrorKind::InvalidConcern {
                    message: "write concern `w` cannot be negative".into(),
                }));
            }
            if n == 0 && self.journal == Some(true) {
                return Err(Error::new(ErrorKind::InvalidConcern {
                    message: "write concern cannot have w=0 and j=true".into(),
                }));
            }
        }
        Ok(())
    }
}

/// The `w` field of a [`WriteConcern`].
#[derive(Clone, Debug, PartialEq)]
pub enum Acknowledgment {
    Nodes(i32),
    Majority,
    Tag(String),
}

impl Serialize for Acknowledgment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Acknowledgment::Nodes(n) => serializer.serialize_i32(*n),
            Acknowledgment::Majority => serializer.serialize_str("majority"),
            Acknowledgment::Tag(tag) => serializer.serialize_str(tag),
        }
    }
}

impl<'de> Deserialize<'de> for Acknowledgment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IntOrString {
            Int(i32),
            String(String),
        }
        Ok(match IntOrString::deserialize(deserializer)? {
            IntOrString::Int(i) => Acknowledgment::Nodes(i),
            IntOrString::String(s) if s == "majority" => Acknowledgment::Majority,
            IntOrString::String(s) => Acknowledgment::Tag(s),
        })
    }
}

impl From<i32> for Acknowledgment {
    fn from(i: i32) -> Self {
        Acknowledgment::Nodes(i)
    }
}

impl From<String> for Acknowledgment {
    fn from(s: String) -> Self {
        if s == "majority" {
            Acknowledgment::Majority
        } else {
            Acknowledgment::Tag(s)
        }
    }
}

/// A `writeConcernError` document nested in a server response.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteConcernError {
    pub code: i32,
    #[serde(rename = "errmsg")]
    pub message: String,
    #[serde(rename = "errorLabels", default)]
    pub labels: Vec<String>,
}
