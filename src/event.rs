//! Storage notification payload, as delivered to the function by the runtime.
//! Only the fields the transform reads are modelled; everything else is ignored.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::process::utils::decode_object_key;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Bucket {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Object {
    /// URL-escaped key, exactly as the notification carries it.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Where a record points, with the key already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl S3EventRecord {
    /// Build a record for `bucket`/`key`, escaping the key the way notifications do.
    pub fn for_object(bucket: &str, key: &str) -> Self {
        let escaped: String = key
            .split(' ')
            .map(|part| {
                percent_encoding::utf8_percent_encode(part, KEY_ESCAPE).to_string()
            })
            .collect::<Vec<_>>()
            .join("+");
        S3EventRecord {
            event_name: Some("ObjectCreated:Put".into()),
            s3: S3Entity {
                bucket: S3Bucket {
                    name: Some(bucket.to_string()),
                },
                object: S3Object {
                    key: Some(escaped),
                    size: None,
                },
            },
        }
    }

    pub fn location(&self) -> Result<ObjectLocation> {
        let bucket = self
            .s3
            .bucket
            .name
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow!("event record has no bucket name"))?;
        let key = self
            .s3
            .object
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("event record for bucket {} has no object key", bucket))?;

        Ok(ObjectLocation {
            bucket: bucket.to_string(),
            key: decode_object_key(key),
        })
    }
}

/// Characters escaped in notification keys: everything but unreserved and `/`.
const KEY_ESCAPE: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');
