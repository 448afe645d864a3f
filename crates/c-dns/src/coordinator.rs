use std::net::SocketAddr;
use std::sync::Arc;

use c_dns_lib::{DnsPacket, Question, ResponseCode};

use crate::cache::AnswerCache;
use crate::upstream::Lookup;

/// Builds a response for every request, answering from the cache where it can
/// and asking the upstream for the rest.
pub struct QueryCoordinator<L> {
    cache: Arc<AnswerCache>,
    upstream: L,
}

impl<L: Lookup> QueryCoordinator<L> {
    pub fn new(cache: Arc<AnswerCache>, upstream: L) -> Self {
        QueryCoordinator { cache, upstream }
    }

    pub fn cache(&self) -> &Arc<AnswerCache> {
        &self.cache
    }

    /// Never fails: questions that couldn't be resolved turn the response into a SERVFAIL
    /// while the remaining questions are still answered. Otherwise the response code stays
    /// NOERROR, whatever the upstream replied with.
    pub async fn resolve(&self, request: &DnsPacket<'_>, client: Option<SocketAddr>) -> DnsPacket<'static> {
        let mut response = DnsPacket::new();
        response.header.id = request.header.id;
        response.header.opcode = request.header.opcode;
        response.header.recursion_desired = request.header.recursion_desired;
        response.header.is_response = true;
        response.header.recursion_available = true;
        response.questions = request.questions.iter().cloned().map(Question::into_owned).collect();

        for question in request.questions.iter() {
            let qname = question.qname.as_ref();
            let query_type = question.query_type;

            if let Some(record) = self.cache.get(qname, query_type) {
                tracing::debug!(?client, qname, ?query_type, "Answering from cache");
                response.answers.push(record);
                continue;
            }

            tracing::debug!(?client, qname, ?query_type, "Forwarding to the upstream resolver");
            match self.upstream.lookup(qname, query_type).await {
                Ok(upstream_response) => {
                    self.cache.put_all(upstream_response.answers.iter().cloned());
                    response.answers.extend(upstream_response.answers);
                    response.authorities.extend(upstream_response.authorities);
                    response.additionals.extend(upstream_response.additionals);
                }
                Err(e) => {
                    tracing::debug!(qname, ?query_type, "Failed to resolve a question: {:#}", e);
                    response.header.response_code = ResponseCode::ServerFailure;
                }
            }
        }

        response.update_counts();
        response
    }
}
