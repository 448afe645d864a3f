use std::{
    borrow::Cow,
    net::{Ipv4Addr, Ipv6Addr},
};

use prop::strategy::Union;
use proptest::collection::vec;
use proptest::prelude::*;

use crate::{QueryType, Question, ResourceRecord};

prop_compose! {
    pub fn arb_question()(qname in arb_qname(), query_type: QueryType, qclass: u16) -> Question<'static> {
        Question { qname, query_type: query_type.normalize(), qclass }
    }
}

prop_compose! {
    pub fn arb_resource_record()(
        name in arb_qname(),
        (query_type, rdata) in arb_rdata(),
        class: u16,
        ttl: u32
    ) -> ResourceRecord<'static> {
        ResourceRecord::from_raw(name, query_type, class, ttl, rdata)
    }
}

fn arb_rdata() -> impl Strategy<Value = (QueryType, Vec<u8>)> {
    let variants = vec![
        any::<Ipv4Addr>()
            .prop_map(|address| (QueryType::A, address.octets().to_vec()))
            .boxed(),
        any::<Ipv6Addr>()
            .prop_map(|address| (QueryType::AAAA, address.octets().to_vec()))
            .boxed(),
        (any::<QueryType>(), vec(any::<u8>(), 0..100))
            .prop_map(|(query_type, rdata)| (query_type.normalize(), rdata))
            .boxed(),
    ];

    Union::new(variants)
}

fn arb_qname() -> impl Strategy<Value = Cow<'static, str>> {
    proptest::string::string_regex(r"(([a-zA-Z0-9][a-zA-Z0-9-]{1,61}\.){1,3}[a-zA-Z0-9]{2,63})|")
        .expect("regex should be valid")
        .prop_map(Cow::Owned)
}
