use std::borrow::Cow;

use crate::{Result, WireError};

/// Upper bound on compression pointers followed while reading a single QNAME
pub const MAX_QNAME_JUMPS: usize = 257;
/// RFC1035: a name takes at most 255 bytes on the wire, length bytes included
pub const MAX_QNAME_LENGTH: usize = 255;
const MAX_LABEL_LENGTH: usize = 0x3f;

pub trait FromBuf: Sized {
    fn from_buf(buf: &mut ByteBuf) -> Result<Self>;
}

pub trait EncodeToBuf {
    fn encode_to_buf(&self, buf: &mut ByteBuf) -> Result<()>;
}

/// Fixed-size byte window with a single read/write cursor.
///
/// The buffer never grows: every read and write is checked against its capacity
/// and fails instead of running past the end.
pub struct ByteBuf<'a> {
    buf: Cow<'a, [u8]>,
    pos: usize,
}

impl<'a> ByteBuf<'a> {
    /// Wraps already received bytes for decoding
    pub fn new<T: AsRef<[u8]> + ?Sized>(src: &'a T) -> ByteBuf<'a> {
        ByteBuf {
            buf: Cow::Borrowed(src.as_ref()),
            pos: 0,
        }
    }

    /// Creates a zeroed buffer of `capacity` bytes for encoding
    pub fn new_empty(capacity: usize) -> ByteBuf<'static> {
        ByteBuf {
            buf: Cow::Owned(vec![0; capacity]),
            pos: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.pos
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.check_seek(pos)?;
        self.pos = pos;
        Ok(())
    }

    /// Everything between the start of the buffer and the cursor
    pub fn bytes_written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn into_written(self) -> Vec<u8> {
        let pos = self.pos;
        let mut bytes = self.buf.into_owned();
        bytes.truncate(pos);
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|bytes| bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2)
            .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4)
            .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure_readable(self.pos, n)?;
        let pos = self.pos;
        self.pos += n;
        Ok(&self.buf[pos..pos + n])
    }

    pub fn write_u8(&mut self, data: u8) -> Result<()> {
        self.write_bytes(&[data])
    }

    pub fn write_u16(&mut self, data: u16) -> Result<()> {
        self.write_bytes(&data.to_be_bytes())
    }

    pub fn write_u32(&mut self, data: u32) -> Result<()> {
        self.write_bytes(&data.to_be_bytes())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if self.pos + data.len() > self.capacity() {
            return Err(WireError::BufferOverflow {
                pos: self.pos,
                needed: data.len(),
                capacity: self.capacity(),
            });
        }
        let pos = self.pos;
        self.buf.to_mut()[pos..pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    /// Reads a domain name, following compression pointers.
    ///
    /// The cursor ends up right after the name as it appears at the starting position:
    /// after the terminating zero byte, or after the first pointer if one was met.
    pub fn read_qname(&mut self) -> Result<Cow<'static, str>> {
        let mut qname = String::new();
        // Wire length of the labels read so far, counting the terminating zero byte
        let mut encoded_length = 1;
        let mut pos = self.pos;
        let mut jumps = 0;
        let mut jumped = false;
        loop {
            self.ensure_readable(pos, 1)?;
            let label_length = self.buf[pos];
            if label_length & 0xC0 == 0xC0 {
                // Jump directive consists of two bytes
                self.ensure_readable(pos, 2)?;
                jumps += 1;
                if jumps > MAX_QNAME_JUMPS {
                    return Err(WireError::TooManyJumps {
                        limit: MAX_QNAME_JUMPS,
                    });
                }
                if !jumped {
                    // Parsing continues after the first jump ptr once the name is resolved
                    self.pos = pos + 2;
                    jumped = true;
                }
                // Clear two MSB bits and join with the second byte
                let offset = ((label_length as usize & 0x3f) << 8) | self.buf[pos + 1] as usize;
                self.check_seek(offset)?;
                pos = offset;
                continue;
            }

            pos += 1;
            if label_length == 0 {
                break;
            }

            let label_length = label_length as usize;
            encoded_length += label_length + 1;
            if encoded_length > MAX_QNAME_LENGTH {
                return Err(WireError::NameTooLong {
                    limit: MAX_QNAME_LENGTH,
                });
            }
            self.ensure_readable(pos, label_length)?;
            // Labels are arbitrary bytes on the wire; anything that isn't UTF-8 gets replaced
            let label = String::from_utf8_lossy(&self.buf[pos..pos + label_length]);
            if !qname.is_empty() {
                qname.push('.');
            }
            qname.push_str(&label);
            pos += label_length;
        }

        if !jumped {
            self.pos = pos;
        }

        Ok(qname.into())
    }

    /// Writes a domain name as plain labels; compression is never produced.
    ///
    /// Returns the number of bytes written.
    pub fn write_qname(&mut self, qname: &str) -> Result<usize> {
        let start = self.pos;
        for label in qname.split('.').filter(|label| !label.is_empty()) {
            if label.len() > MAX_LABEL_LENGTH {
                return Err(WireError::LabelTooLong {
                    len: label.len(),
                    label: label.to_owned(),
                });
            }
            self.write_u8(label.len() as u8)?;
            self.write_bytes(label.as_bytes())?;
        }
        self.write_u8(0)?;

        Ok(self.pos - start)
    }

    fn ensure_readable(&self, pos: usize, n: usize) -> Result<()> {
        if self.buf.len() < pos + n {
            return Err(WireError::BufferUnderflow {
                pos,
                needed: n,
                len: self.buf.len(),
            });
        }
        Ok(())
    }

    fn check_seek(&self, pos: usize) -> Result<()> {
        if pos > self.capacity() {
            return Err(WireError::InvalidSeek {
                pos,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut buf = ByteBuf::new_empty(7);
        buf.write_u8(42).expect("shouldn't have failed");
        buf.write_u16(0x1234).expect("shouldn't have failed");
        buf.write_u32(0x12345678).expect("shouldn't have failed");
        assert_eq!(buf.bytes_written(), &[42, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78]);

        buf.seek(0).expect("shouldn't have failed");
        assert_eq!(buf.read_u8().unwrap(), 42);
        assert_eq!(buf.read_u16().unwrap(), 0x1234);
        assert_eq!(buf.read_u32().unwrap(), 0x12345678);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn read_past_end() {
        let mut buf = ByteBuf::new(&[0x1, 0x2, 0x3]);
        buf.read_u16().expect("shouldn't have failed");
        let err = buf.read_u16().unwrap_err();
        assert_eq!(err, WireError::BufferUnderflow { pos: 2, needed: 2, len: 3 });
        // A failed read doesn't move the cursor
        assert_eq!(buf.pos(), 2);
    }

    #[test]
    fn write_past_capacity() {
        let mut buf = ByteBuf::new_empty(3);
        buf.write_u16(0xffff).expect("shouldn't have failed");
        assert!(matches!(
            buf.write_u32(1),
            Err(WireError::BufferOverflow { pos: 2, needed: 4, capacity: 3 })
        ));
        assert_eq!(buf.bytes_written(), &[0xff, 0xff]);
    }

    #[test]
    fn seek_out_of_bounds() {
        let mut buf = ByteBuf::new_empty(4);
        assert!(buf.seek(4).is_ok());
        assert_eq!(buf.seek(5), Err(WireError::InvalidSeek { pos: 5, capacity: 4 }));
        assert_eq!(buf.pos(), 4);
    }

    #[test]
    fn read_empty_qname() {
        let qname = &[0x0];
        let mut buf = ByteBuf::new(qname);
        let result = buf.read_qname().expect("shouldn't have failed");
        assert_eq!(result, "");
        assert_eq!(buf.pos(), 1);
    }

    #[test]
    fn read_valid_qname() {
        let qname = &[0x6, 0x67, 0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x3, 0x63, 0x6f, 0x6d, 0x0];
        let mut buf = ByteBuf::new(qname);
        let result = buf.read_qname().expect("shouldn't have failed");
        assert_eq!(result, "google.com");
        assert_eq!(buf.pos(), qname.len());
    }

    #[test]
    #[should_panic(expected = "end of buffer: need 111 byte(s) at position 1")]
    fn read_invalid_qname() {
        let qname = &[0x6f, 0x67, 0x6f];
        let mut buf = ByteBuf::new(qname);
        buf.read_qname().unwrap();
    }

    #[test]
    #[should_panic(expected = "end of buffer")]
    fn read_qname_without_zero_byte() {
        let qname = &[0x2, 0x67, 0x6f];
        let mut buf = ByteBuf::new(qname);
        buf.read_qname().unwrap();
    }

    #[test]
    fn read_non_utf8_label() {
        let qname = &[0x2, 0xff, 0xfe, 0x3, b'c', b'o', b'm', 0x0];
        let mut buf = ByteBuf::new(qname);
        let result = buf.read_qname().expect("shouldn't have failed");
        assert_eq!(result, "\u{fffd}\u{fffd}.com");
        assert_eq!(buf.pos(), qname.len());
    }

    #[test]
    fn read_qname_at_length_limit() {
        let mut longest = ByteBuf::new_empty(MAX_QNAME_LENGTH);
        let labels = ["a".repeat(63), "b".repeat(63), "c".repeat(63), "d".repeat(61)];
        longest.write_qname(&labels.join(".")).expect("shouldn't have failed");
        assert_eq!(longest.remaining(), 0);

        longest.seek(0).expect("shouldn't have failed");
        let qname = longest.read_qname().expect("shouldn't have failed");
        assert_eq!(qname.len(), MAX_QNAME_LENGTH - 2);

        let mut too_long = ByteBuf::new_empty(MAX_QNAME_LENGTH + 1);
        let labels = ["a".repeat(63), "b".repeat(63), "c".repeat(63), "d".repeat(62)];
        too_long.write_qname(&labels.join(".")).expect("shouldn't have failed");
        too_long.seek(0).expect("shouldn't have failed");
        assert_eq!(
            too_long.read_qname(),
            Err(WireError::NameTooLong { limit: MAX_QNAME_LENGTH })
        );
    }

    #[test]
    fn long_label_looping_back_is_cut_short() {
        // 63-byte label followed by a pointer to itself
        let mut packet = vec![63];
        packet.extend(std::iter::repeat(b'a').take(63));
        packet.extend([0xc0, 0x0]);
        let mut buf = ByteBuf::new(&packet);
        assert_eq!(
            buf.read_qname(),
            Err(WireError::NameTooLong { limit: MAX_QNAME_LENGTH })
        );
    }

    #[test]
    fn read_compressed_qname() {
        let packet = &[
            // 'com' at offset 0
            0x3, b'c', b'o', b'm', 0x0,
            // 'example' + pointer to offset 0
            0x7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0xc0, 0x0,
            // trailing data that must be left for the next reader
            0xab,
        ];
        let mut buf = ByteBuf::new(packet);
        buf.seek(5).expect("shouldn't have failed");
        let result = buf.read_qname().expect("shouldn't have failed");
        assert_eq!(result, "example.com");
        assert_eq!(buf.read_u8().unwrap(), 0xab);
    }

    #[test]
    fn read_chained_pointers() {
        let packet = &[
            0x3, b'c', b'o', b'm', 0x0,
            // 'example' -> 'com'
            0x7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0xc0, 0x0,
            // 'www' -> 'example'
            0x3, b'w', b'w', b'w', 0xc0, 0x5,
        ];
        let mut buf = ByteBuf::new(packet);
        buf.seek(15).expect("shouldn't have failed");
        assert_eq!(buf.read_qname().unwrap(), "www.example.com");
        assert_eq!(buf.pos(), packet.len());
    }

    #[test]
    fn read_self_referencing_pointer() {
        let packet = &[0xc0, 0x0];
        let mut buf = ByteBuf::new(packet);
        assert_eq!(
            buf.read_qname(),
            Err(WireError::TooManyJumps { limit: MAX_QNAME_JUMPS })
        );
    }

    #[test]
    fn read_pointer_cycle() {
        // Two labels pointing at each other; the name outgrows its limit before the jumps run out
        let packet = &[0x1, b'a', 0xc0, 0x4, 0x1, b'b', 0xc0, 0x0];
        let mut buf = ByteBuf::new(packet);
        assert!(matches!(buf.read_qname(), Err(WireError::NameTooLong { .. })));
    }

    #[test]
    fn read_pointer_out_of_bounds() {
        let packet = &[0x1, b'a', 0xc0, 0xff];
        let mut buf = ByteBuf::new(packet);
        assert_eq!(
            buf.read_qname(),
            Err(WireError::InvalidSeek { pos: 0xff, capacity: 4 })
        );
    }

    #[test]
    fn write_empty_qname() {
        let mut buf = ByteBuf::new_empty(16);
        assert_eq!(buf.write_qname("").expect("shouldn't have failed"), 1);
        assert_eq!(buf.bytes_written(), &[0x0])
    }

    #[test]
    fn write_qname() {
        let qname = "google.com";
        let mut buf = ByteBuf::new_empty(512);
        buf.write_qname(qname).expect("shouldn't have failed");
        assert_eq!(
            buf.bytes_written(),
            &[0x6, 0x67, 0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x3, 0x63, 0x6f, 0x6d, 0x0,]
        )
    }

    #[test]
    fn write_fully_qualified_qname() {
        let mut buf = ByteBuf::new_empty(512);
        buf.write_qname("google.com.").expect("shouldn't have failed");
        let mut other = ByteBuf::new_empty(512);
        other.write_qname("google.com").expect("shouldn't have failed");
        assert_eq!(buf.bytes_written(), other.bytes_written());
    }

    #[test]
    #[should_panic(
        expected = "label is too long (64): very_very_very_very_very_very_long_label_that_exceeds_max_length"
    )]
    fn write_qname_with_long_label() {
        let qname = "very_very_very_very_very_very_long_label_that_exceeds_max_length.com";
        let mut buf = ByteBuf::new_empty(512);
        buf.write_qname(qname).unwrap();
    }

    #[test]
    fn write_qname_with_max_label() {
        let label = "a".repeat(63);
        let qname = format!("{}.com", label);
        let mut buf = ByteBuf::new_empty(512);
        let written = buf.write_qname(&qname).expect("shouldn't have failed");
        assert_eq!(written, 1 + 63 + 1 + 3 + 1);
        assert_eq!(buf.bytes_written()[0], 63);
    }

    #[test]
    fn qname_roundtrip() {
        let qname = "google.com";
        let mut buf = ByteBuf::new_empty(512);
        buf.write_qname(qname).expect("shouldn't have failed");
        buf.seek(0).expect("shouldn't have failed");
        let roundtripped = buf.read_qname().expect("shouldn't have failed");
        assert_eq!(qname, roundtripped);
    }
}
