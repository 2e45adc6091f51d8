use crate::protocol::{
    packet::VersionedPacket,
    version::{Breakpoint, ProtocolVersion, VersionTable},
    DecodeError, Decoder, EncodeError, Encoder,
};

/// Serverbound keep-alive, echoing the code the server sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeepAlive {
    pub code: i64,
}

/// Wire type of the keep-alive code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodeEncoding {
    Int,
    VarInt,
    Long,
}

static PACKET_ID: VersionTable<i32> = VersionTable::new(
    &[
        (Breakpoint::V1_14.protocol(), 0x0F),
        (Breakpoint::V1_13Pre7.protocol(), 0x0E),
        (Breakpoint::V1_13Pre4.protocol(), 0x0C),
        (Breakpoint::V17w45a.protocol(), 0x0A),
        (Breakpoint::V17w31a.protocol(), 0x0B),
        (Breakpoint::V1_12Pre5.protocol(), 0x0C),
        (Breakpoint::V17w13a.protocol(), 0x0C),
        (Breakpoint::V15w43a.protocol(), 0x0B),
        (Breakpoint::V15w36a.protocol(), 0x0A),
    ],
    0x00,
);

static CODE_ENCODING: VersionTable<CodeEncoding> = VersionTable::new(
    &[
        (Breakpoint::V1_12_2Pre1.protocol(), CodeEncoding::Long),
        (Breakpoint::V14w31a.protocol(), CodeEncoding::VarInt),
    ],
    CodeEncoding::Int,
);

impl KeepAlive {
    pub fn new(code: i64) -> Self {
        Self { code }
    }

    pub fn code_encoding(version: ProtocolVersion) -> CodeEncoding {
        *CODE_ENCODING.resolve_version(version)
    }
}

impl VersionedPacket for KeepAlive {
    fn packet_id(version: ProtocolVersion) -> i32 {
        *PACKET_ID.resolve_version(version)
    }

    fn encode_body(
        &self,
        encoder: &mut Encoder,
        version: ProtocolVersion,
    ) -> Result<(), EncodeError> {
        let narrow =
            || i32::try_from(self.code).map_err(|_| EncodeError::OutOfRange(self.code));
        match Self::code_encoding(version) {
            CodeEncoding::Long => encoder.write_i64(self.code),
            CodeEncoding::VarInt => {
                encoder.write_var_int(narrow()?);
            }
            CodeEncoding::Int => encoder.write_i32(narrow()?),
        }
        Ok(())
    }

    fn decode_body(decoder: &mut Decoder, version: ProtocolVersion) -> Result<Self, DecodeError> {
        let code = match Self::code_encoding(version) {
            CodeEncoding::Long => decoder.read_i64()?,
            CodeEncoding::VarInt => i64::from(decoder.read_var_int()?),
            CodeEncoding::Int => i64::from(decoder.read_i32()?),
        };
        Ok(Self { code })
    }
}
