//! Forge handshake structures.

use crate::{
    equality,
    protocol::{Decode, DecodeError, Decoder, Encode, EncodeError, Encoder},
};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

/// A mod's identifier and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModInfo {
    pub name: String,
    pub version: String,
}

impl ModInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl Encode for ModInfo {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.write_string(&self.name)?;
        encoder.write_string(&self.version)
    }
}

impl Decode for ModInfo {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let name = decoder.read_string()?.to_owned();
        let version = decoder.read_string()?.to_owned();
        Ok(Self { name, version })
    }
}

/// Every mod installed on one side of the connection.
///
/// The client sends its list first and the server answers with its own,
/// which matches the one advertised in its status response.
#[derive(Debug, Clone, Default, Eq)]
pub struct ModList {
    mods: Vec<ModInfo>,
}

impl ModList {
    /// Leading byte identifying a mod list among the Forge handshake
    /// structures.
    pub const DISCRIMINATOR: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mods(mods: Vec<ModInfo>) -> Self {
        Self { mods }
    }

    pub fn into_mods(self) -> Vec<ModInfo> {
        self.mods
    }

    pub fn push(&mut self, info: ModInfo) {
        self.mods.push(info);
    }

    pub fn insert(&mut self, index: usize, info: ModInfo) {
        self.mods.insert(index, info);
    }

    pub fn remove(&mut self, index: usize) -> ModInfo {
        self.mods.remove(index)
    }

    /// Removes the first entry equal to `info`, returning whether one was
    /// found.
    pub fn remove_mod(&mut self, info: &ModInfo) -> bool {
        match self.mods.iter().position(|m| m == info) {
            Some(index) => {
                self.mods.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.mods.clear();
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = Vec::new();
        self.encode(&mut Encoder::new(&mut buffer))?;
        Ok(buffer)
    }

    /// Decodes a mod list that must span all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        let list = Self::decode(&mut decoder)?;
        if !decoder.is_finished() {
            return Err(DecodeError::TrailingBytes(decoder.remaining()));
        }
        Ok(list)
    }
}

impl Encode for ModList {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.write_u8(Self::DISCRIMINATOR);
        encoder.write_length(self.mods.len())?;
        for info in &self.mods {
            info.encode(encoder)?;
        }
        Ok(())
    }
}

impl Decode for ModList {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        decoder.read_atomic(|decoder| {
            let (found, _) = decoder.peek(|d| d.read_u8())?;
            if found != Self::DISCRIMINATOR {
                return Err(DecodeError::InvalidDiscriminator {
                    expected: Self::DISCRIMINATOR,
                    found,
                });
            }
            decoder.read_u8()?;

            let count = decoder.read_length()?;
            // each entry takes at least two bytes
            let mut mods = Vec::with_capacity(count.min(decoder.remaining() / 2));
            for _ in 0..count {
                mods.push(ModInfo::decode(decoder)?);
            }
            Ok(Self { mods })
        })
    }
}

impl PartialEq for ModList {
    fn eq(&self, other: &Self) -> bool {
        equality::sequences_equal(Some(self.mods.as_slice()), Some(other.mods.as_slice()))
    }
}

impl PartialEq<[ModInfo]> for ModList {
    fn eq(&self, other: &[ModInfo]) -> bool {
        equality::sequences_equal(Some(self.mods.as_slice()), Some(other))
    }
}

impl PartialEq<Vec<ModInfo>> for ModList {
    fn eq(&self, other: &Vec<ModInfo>) -> bool {
        self == other.as_slice()
    }
}

impl Deref for ModList {
    type Target = [ModInfo];

    fn deref(&self) -> &Self::Target {
        &self.mods
    }
}

impl DerefMut for ModList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.mods
    }
}

impl From<Vec<ModInfo>> for ModList {
    fn from(mods: Vec<ModInfo>) -> Self {
        Self::from_mods(mods)
    }
}

impl FromIterator<ModInfo> for ModList {
    fn from_iter<I: IntoIterator<Item = ModInfo>>(iter: I) -> Self {
        Self::from_mods(iter.into_iter().collect())
    }
}

impl Extend<ModInfo> for ModList {
    fn extend<I: IntoIterator<Item = ModInfo>>(&mut self, iter: I) {
        self.mods.extend(iter);
    }
}

impl IntoIterator for ModList {
    type Item = ModInfo;
    type IntoIter = std::vec::IntoIter<ModInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.into_iter()
    }
}

impl<'a> IntoIterator for &'a ModList {
    type Item = &'a ModInfo;
    type IntoIter = std::slice::Iter<'a, ModInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}

impl fmt::Display for ModList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, info) in self.mods.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{info}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModList {
        [ModInfo::new("modA", "1.0"), ModInfo::new("modB", "2.3")]
            .into_iter()
            .collect()
    }

    const SAMPLE_BYTES: &[u8] = &[
        0x02, 0x02, //
        0x04, b'm', b'o', b'd', b'A', 0x03, b'1', b'.', b'0', //
        0x04, b'm', b'o', b'd', b'B', 0x03, b'2', b'.', b'3',
    ];

    #[test]
    fn wire_format() {
        assert_eq!(sample().to_bytes().unwrap(), SAMPLE_BYTES);
        let decoded = ModList::from_bytes(SAMPLE_BYTES).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.to_string(), "modA@1.0,modB@2.3");
    }

    #[test]
    fn wrong_discriminator_consumes_nothing() {
        let mut bytes = SAMPLE_BYTES.to_vec();
        bytes[0] = 3;
        let mut decoder = Decoder::new(&bytes);
        assert!(matches!(
            ModList::decode(&mut decoder),
            Err(DecodeError::InvalidDiscriminator {
                expected: 2,
                found: 3
            })
        ));
        assert_eq!(decoder.position(), 0);

        assert!(matches!(
            ModList::from_bytes(&[]),
            Err(DecodeError::EndOfStream { .. })
        ));
    }

    #[test]
    fn truncated_and_oversized_input() {
        assert!(ModList::from_bytes(&SAMPLE_BYTES[..SAMPLE_BYTES.len() - 1]).is_err());

        let mut bytes = SAMPLE_BYTES.to_vec();
        bytes.push(0);
        assert!(matches!(
            ModList::from_bytes(&bytes),
            Err(DecodeError::TrailingBytes(1))
        ));

        // a huge count with no entries fails without preallocating it
        let bytes = [0x02, 0xff, 0xff, 0xff, 0xff, 0x07];
        assert!(ModList::from_bytes(&bytes).is_err());
    }

    #[test]
    fn list_operations() {
        let mut list = ModList::new();
        assert!(list.is_empty());
        list.push(ModInfo::new("modB", "2.3"));
        list.insert(0, ModInfo::new("modA", "1.0"));
        assert_eq!(list, sample());
        assert!(list.contains(&ModInfo::new("modA", "1.0")));
        assert_eq!(list[1].name, "modB");

        list[1].version = "2.4".into();
        assert_ne!(list, sample());

        assert!(list.remove_mod(&ModInfo::new("modA", "1.0")));
        assert!(!list.remove_mod(&ModInfo::new("modA", "1.0")));
        assert_eq!(list.remove(0).version, "2.4");

        list.extend(sample());
        assert_eq!(list, vec![ModInfo::new("modA", "1.0"), ModInfo::new("modB", "2.3")]);
        assert_eq!((&list).into_iter().count(), 2);
        list.clear();
        assert_eq!(list.len(), 0);
    }
}
