use std::{
    borrow::Cow,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use crate::{ByteBuf, EncodeToBuf, FromBuf, QueryType, Result, WireError, IN_CLASS};

/// Typed view over RDATA, derived once when a record is constructed.
///
/// Only addresses are interpreted; everything else stays `Opaque` and is served from the raw bytes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResourceData {
    A { address: Ipv4Addr },
    AAAA { address: Ipv6Addr },
    Opaque,
}

impl ResourceData {
    fn from_rdata(query_type: QueryType, rdata: &[u8]) -> Self {
        match query_type {
            QueryType::A => <[u8; 4]>::try_from(rdata)
                .map(|octets| ResourceData::A {
                    address: octets.into(),
                })
                .unwrap_or(ResourceData::Opaque),
            QueryType::AAAA => <[u8; 16]>::try_from(rdata)
                .map(|octets| ResourceData::AAAA {
                    address: octets.into(),
                })
                .unwrap_or(ResourceData::Opaque),
            _ => ResourceData::Opaque,
        }
    }
}

/// A resource record as it appears on the wire.
///
/// The raw RDATA is what gets encoded; `resource_data` is only a convenience view of it,
/// so both are kept private to keep them in sync.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResourceRecord<'a> {
    pub name: Cow<'a, str>,
    pub class: u16,
    pub ttl: u32,
    query_type: QueryType,
    rdata: Cow<'a, [u8]>,
    resource_data: ResourceData,
}

impl<'a> ResourceRecord<'a> {
    pub fn from_raw(
        name: impl Into<Cow<'a, str>>,
        query_type: QueryType,
        class: u16,
        ttl: u32,
        rdata: impl Into<Cow<'a, [u8]>>,
    ) -> Self {
        let query_type = query_type.normalize();
        let rdata = rdata.into();
        ResourceRecord {
            name: name.into(),
            class,
            ttl,
            query_type,
            resource_data: ResourceData::from_rdata(query_type, &rdata),
            rdata,
        }
    }

    pub fn new_a(name: impl Into<Cow<'a, str>>, address: Ipv4Addr, ttl: u32) -> Self {
        Self::from_raw(name, QueryType::A, IN_CLASS, ttl, address.octets().to_vec())
    }

    pub fn new_aaaa(name: impl Into<Cow<'a, str>>, address: Ipv6Addr, ttl: u32) -> Self {
        Self::from_raw(name, QueryType::AAAA, IN_CLASS, ttl, address.octets().to_vec())
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn rdata(&self) -> &[u8] {
        &self.rdata
    }

    pub fn resource_data(&self) -> ResourceData {
        self.resource_data
    }

    pub fn address(&self) -> Option<IpAddr> {
        match self.resource_data {
            ResourceData::A { address } => Some(address.into()),
            ResourceData::AAAA { address } => Some(address.into()),
            ResourceData::Opaque => None,
        }
    }

    pub fn into_owned(self) -> ResourceRecord<'static> {
        ResourceRecord {
            name: self.name.into_owned().into(),
            class: self.class,
            ttl: self.ttl,
            query_type: self.query_type,
            rdata: self.rdata.into_owned().into(),
            resource_data: self.resource_data,
        }
    }
}

impl FromBuf for ResourceRecord<'static> {
    fn from_buf(buf: &mut ByteBuf) -> Result<ResourceRecord<'static>> {
        let name = buf.read_qname()?;
        let query_type: QueryType = buf.read_u16()?.into();
        let class = buf.read_u16()?;
        let ttl = buf.read_u32()?;
        let rd_length = buf.read_u16()? as usize;
        if rd_length > buf.remaining() {
            return Err(WireError::RdataOverflow {
                rd_length,
                remaining: buf.remaining(),
            });
        }
        let rdata = buf.read_bytes(rd_length)?.to_vec();

        Ok(ResourceRecord::from_raw(name, query_type, class, ttl, rdata))
    }
}

impl EncodeToBuf for ResourceRecord<'_> {
    fn encode_to_buf(&self, buf: &mut ByteBuf) -> Result<()> {
        buf.write_qname(&self.name)?;
        buf.write_u16(self.query_type.into())?;
        buf.write_u16(self.class)?;
        buf.write_u32(self.ttl)?;
        buf.write_u16(self.rdata.len() as u16)?;
        buf.write_bytes(&self.rdata)?;

        Ok(())
    }
}
