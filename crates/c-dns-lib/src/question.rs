use crate::{ByteBuf, EncodeToBuf, FromBuf, Result, IN_CLASS};
use std::borrow::Cow;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum QueryType {
    UNKNOWN(u16),
    A,
    NS,
    CNAME,
    SOA,
    MX,
    AAAA,
}

impl From<u16> for QueryType {
    fn from(value: u16) -> Self {
        match value {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            6 => QueryType::SOA,
            15 => QueryType::MX,
            28 => QueryType::AAAA,
            _ => QueryType::UNKNOWN(value),
        }
    }
}

impl From<QueryType> for u16 {
    fn from(val: QueryType) -> Self {
        match val {
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::SOA => 6,
            QueryType::MX => 15,
            QueryType::AAAA => 28,
            QueryType::UNKNOWN(qtype) => qtype,
        }
    }
}

impl QueryType {
    /// Folds `UNKNOWN` values that collide with a known type into that type
    pub fn normalize(self) -> Self {
        u16::from(self).into()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Question<'a> {
    pub qname: Cow<'a, str>,
    pub query_type: QueryType,
    pub qclass: u16,
}

impl<'a> Question<'a> {
    pub fn new(qname: impl Into<Cow<'a, str>>, query_type: QueryType, qclass: Option<u16>) -> Self {
        Self {
            qname: qname.into(),
            query_type,
            qclass: qclass.unwrap_or(IN_CLASS),
        }
    }

    pub fn into_owned(self) -> Question<'static> {
        Question {
            qname: self.qname.into_owned().into(),
            query_type: self.query_type,
            qclass: self.qclass,
        }
    }
}

impl FromBuf for Question<'static> {
    fn from_buf(buf: &mut ByteBuf) -> Result<Question<'static>> {
        let qname = buf.read_qname()?;
        let qtype_raw = buf.read_u16()?;
        let class = buf.read_u16()?;

        Ok(Question {
            qname,
            query_type: qtype_raw.into(),
            qclass: class,
        })
    }
}

impl EncodeToBuf for Question<'_> {
    fn encode_to_buf(&self, buf: &mut ByteBuf) -> Result<()> {
        buf.write_qname(&self.qname)?;
        buf.write_u16(self.query_type.into())?;
        buf.write_u16(self.qclass)?;

        Ok(())
    }
}
