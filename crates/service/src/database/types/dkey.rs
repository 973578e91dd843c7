use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

use common::crypto::{PublicKey, SecretKey, PUBLIC_KEY_SIZE};

/// Raw X25519 key half (public or secret), stored as a BLOB
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct DKey([u8; 32]);

impl std::fmt::Debug for DKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // may hold a secret key
        f.write_str("DKey(..)")
    }
}

impl From<&PublicKey> for DKey {
    fn from(key: &PublicKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<&SecretKey> for DKey {
    fn from(key: &SecretKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<DKey> for PublicKey {
    fn from(val: DKey) -> Self {
        PublicKey::from(val.0)
    }
}

impl From<DKey> for SecretKey {
    fn from(val: DKey) -> Self {
        SecretKey::from(val.0)
    }
}

impl Decode<'_, Sqlite> for DKey {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let bytes = <Vec<u8> as Decode<Sqlite>>::decode(value)?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            format!(
                "expected a {} byte key, found {} bytes",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
        })?;
        Ok(Self(key))
    }
}

impl Encode<'_, Sqlite> for DKey {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Blob(self.0.to_vec().into()));
        Ok(IsNull::No)
    }
}

impl Type<Sqlite> for DKey {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <Vec<u8> as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <Vec<u8> as Type<Sqlite>>::type_info()
    }
}
