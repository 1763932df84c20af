//! Timestamp extension (type id -1).
//!
//! Three wire forms exist, all read by both codecs here:
//!
//! - FixExt4: `u32` seconds.
//! - FixExt8: one `u64` packing 30 bits of nanoseconds over 34 bits of seconds.
//! - Ext8 with length 12: `u32` nanoseconds followed by `i64` seconds.

use super::{Codec, DynCodec};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::{Timestamp, Value};
use crate::wire::tag;

/// Extension type id of timestamps.
pub const EXT_TYPE: i8 = -1;

/// Payload length of the general 96-bit form.
const EXT8_LEN: u8 = 12;

/// Largest second count the packed FixExt8 form can carry.
const MAX_PACKED_SECONDS: i64 = (1 << 34) - 1;

/// Writes every timestamp in the general 12-byte form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time;

/// Writes each timestamp in the narrowest of the three forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactTime;

impl Codec for Time {
    type Value = Timestamp;

    fn encode(&self, buf: &mut WriteBuffer, value: &Timestamp) -> Result<(), CodecError> {
        encode_general(buf, *value);
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Timestamp, CodecError> {
        decode_timestamp(buf)
    }
}

impl Codec for CompactTime {
    type Value = Timestamp;

    fn encode(&self, buf: &mut WriteBuffer, value: &Timestamp) -> Result<(), CodecError> {
        let seconds = value.seconds();
        let nanos = value.subsec_nanos();
        match u32::try_from(seconds) {
            Ok(s) if nanos == 0 => {
                buf.put_u8(tag::FIX_EXT_4);
                buf.put_i8(EXT_TYPE);
                buf.put_u32(s);
            }
            _ if (0..=MAX_PACKED_SECONDS).contains(&seconds) => {
                buf.put_u8(tag::FIX_EXT_8);
                buf.put_i8(EXT_TYPE);
                buf.put_u32((nanos << 2) | (seconds >> 32) as u32);
                buf.put_u32(seconds as u32);
            }
            _ => encode_general(buf, *value),
        }
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Timestamp, CodecError> {
        decode_timestamp(buf)
    }
}

impl DynCodec for Time {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_time()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Time)
    }
}

impl DynCodec for CompactTime {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_time()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Time)
    }
}

fn encode_general(buf: &mut WriteBuffer, value: Timestamp) {
    buf.put_u8(tag::EXT_8);
    buf.put_u8(EXT8_LEN);
    buf.put_i8(EXT_TYPE);
    buf.put_u32(value.subsec_nanos());
    buf.put_i64(value.seconds());
}

fn decode_timestamp(buf: &mut ReadBuffer<'_>) -> Result<Timestamp, CodecError> {
    let m = buf.get_u8()?;
    let (seconds, nanos) = match m {
        tag::FIX_EXT_4 => {
            expect_ext_type(buf, m)?;
            (i64::from(buf.get_u32()?), 0)
        }
        tag::FIX_EXT_8 => {
            expect_ext_type(buf, m)?;
            let hi = buf.get_u32()?;
            let lo = buf.get_u32()?;
            let seconds = (i64::from(hi & 0x3) << 32) | i64::from(lo);
            (seconds, hi >> 2)
        }
        tag::EXT_8 => {
            if buf.get_u8()? != EXT8_LEN {
                return Err(CodecError::tag(m, "time"));
            }
            expect_ext_type(buf, m)?;
            let nanos = buf.get_u32()?;
            (buf.get_i64()?, nanos)
        }
        _ => return Err(CodecError::tag(m, "time")),
    };
    seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(i64::from(nanos / 1_000_000)))
        .map(Timestamp::from_millis)
        .ok_or(CodecError::Overflow("timestamp"))
}

fn expect_ext_type(buf: &mut ReadBuffer<'_>, m: u8) -> Result<(), CodecError> {
    if buf.get_i8()? == EXT_TYPE {
        Ok(())
    } else {
        Err(CodecError::tag(m, "time"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2017-09-26T13:14:15Z
    const SECONDS: i64 = 1_506_431_655;

    fn enc<C: Codec<Value = Timestamp>>(codec: C, millis: i64) -> Vec<u8> {
        let mut buf = WriteBuffer::new();
        codec
            .encode(&mut buf, &Timestamp::from_millis(millis))
            .expect("encode failed");
        buf.into_vec()
    }

    fn dec(data: &[u8]) -> Result<Timestamp, CodecError> {
        Time.decode(&mut ReadBuffer::new(data))
    }

    #[test]
    fn encode_general_form() {
        assert_eq!(
            enc(Time, SECONDS * 1000),
            vec![
                tag::EXT_8, 12, 0xFF, //
                0x00, 0x00, 0x00, 0x00, //
                0x00, 0x00, 0x00, 0x00, 0x59, 0xCA, 0x52, 0xA7,
            ]
        );
        assert_eq!(
            enc(Time, SECONDS * 1000 + 16),
            vec![
                tag::EXT_8, 12, 0xFF, //
                0x00, 0xF4, 0x24, 0x00, //
                0x00, 0x00, 0x00, 0x00, 0x59, 0xCA, 0x52, 0xA7,
            ]
        );
    }

    #[test]
    fn decode_all_tiers() {
        let four = [tag::FIX_EXT_4, 0xFF, 0x59, 0xCA, 0x52, 0xA7];
        assert_eq!(dec(&four).unwrap().millis(), SECONDS * 1000);

        let eight = [tag::FIX_EXT_8, 0xFF, 0x03, 0xD0, 0x90, 0x00, 0x59, 0xCA, 0x52, 0xA7];
        assert_eq!(dec(&eight).unwrap().millis(), SECONDS * 1000 + 16);

        let general = enc(Time, SECONDS * 1000 + 16);
        assert_eq!(dec(&general).unwrap(), dec(&eight).unwrap());
    }

    #[test]
    fn round_trip_general() {
        for millis in [0, 1, 999, SECONDS * 1000 + 16, -1, -1500, i64::MAX / 1000 * 1000] {
            assert_eq!(dec(&enc(Time, millis)).unwrap().millis(), millis, "failed for {millis}");
        }
    }

    #[test]
    fn compact_picks_narrowest_form() {
        assert_eq!(enc(CompactTime, SECONDS * 1000)[0], tag::FIX_EXT_4);
        assert_eq!(
            enc(CompactTime, SECONDS * 1000 + 16),
            vec![tag::FIX_EXT_8, 0xFF, 0x03, 0xD0, 0x90, 0x00, 0x59, 0xCA, 0x52, 0xA7]
        );
        // Beyond 32-bit seconds but within the packed 34 bits.
        assert_eq!(enc(CompactTime, (1 << 33) * 1000)[0], tag::FIX_EXT_8);
        assert_eq!(enc(CompactTime, (1 << 34) * 1000)[0], tag::EXT_8);
        assert_eq!(enc(CompactTime, -1000)[0], tag::EXT_8);
    }

    #[test]
    fn round_trip_compact() {
        for millis in [0, 16, SECONDS * 1000, SECONDS * 1000 + 999, (1 << 34) * 1000 - 1, -2500] {
            let data = enc(CompactTime, millis);
            let t = CompactTime.decode(&mut ReadBuffer::new(&data)).unwrap();
            assert_eq!(t.millis(), millis, "failed for {millis}");
        }
    }

    #[test]
    fn wrong_ext_type_is_type_error() {
        let data = [tag::FIX_EXT_4, 0x01, 0x00, 0x00, 0x00, 0x01];
        assert!(dec(&data).unwrap_err().is_type_error());

        let data = [tag::EXT_8, 8, 0xFF];
        assert!(dec(&data).unwrap_err().is_type_error());

        assert!(dec(&[tag::FIX_EXT_1, 0xFF, 0x00]).unwrap_err().is_type_error());
    }

    #[test]
    fn seconds_overflow() {
        let mut data = vec![tag::EXT_8, 12, 0xFF, 0, 0, 0, 0];
        data.extend_from_slice(&i64::MAX.to_be_bytes());
        assert!(matches!(dec(&data), Err(CodecError::Overflow(_))));
    }
}
