// src/dns/axfr.rs
//! AXFR over TCP using hickory's message codec

use async_trait::async_trait;
use hickory_resolver::proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_resolver::proto::rr::{Name, RecordType};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Upper bound on messages read for one transfer
const MAX_MESSAGES: usize = 10_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AxfrError {
    /// The server answered but will not transfer the zone
    #[error("transfer refused ({0})")]
    Refused(String),
    #[error("transfer timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl AxfrError {
    pub fn is_refusal(&self) -> bool {
        matches!(self, AxfrError::Refused(_))
    }
}

impl From<std::io::Error> for AxfrError {
    fn from(e: std::io::Error) -> Self {
        AxfrError::Io(e.to_string())
    }
}

/// Full zone transfer against one nameserver
#[async_trait]
pub trait ZoneTransfer: Send + Sync {
    /// Owner names of every record in the zone
    async fn transfer(
        &self,
        server: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, AxfrError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AxfrClient;

impl AxfrClient {
    pub fn new() -> Self {
        Self
    }

    /// Encoded AXFR query for `domain`
    pub fn build_query(domain: &str, id: u16) -> Result<Vec<u8>, AxfrError> {
        let name = Name::from_ascii(format!("{}.", domain.trim_end_matches('.')))
            .map_err(|e| AxfrError::Protocol(e.to_string()))?;

        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(false);
        message.add_query(Query::query(name, RecordType::AXFR));

        message
            .to_vec()
            .map_err(|e| AxfrError::Protocol(e.to_string()))
    }

    async fn run(stream: &mut TcpStream, domain: &str) -> Result<Vec<String>, AxfrError> {
        let id = query_id();
        let query = Self::build_query(domain, id)?;

        let len = u16::try_from(query.len()).map_err(|_| AxfrError::Protocol("query too large".into()))?;
        stream.write_all(&len.to_be_bytes()).await?;
        stream.write_all(&query).await?;
        stream.flush().await?;

        let mut names = Vec::new();
        let mut soa_seen = 0;

        for _ in 0..MAX_MESSAGES {
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
            stream.read_exact(&mut buf).await?;

            let response =
                Message::from_vec(&buf).map_err(|e| AxfrError::Protocol(e.to_string()))?;
            if response.id() != id {
                return Err(AxfrError::Protocol(format!(
                    "unexpected message id {}",
                    response.id()
                )));
            }

            match response.response_code() {
                ResponseCode::NoError => {}
                code @ (ResponseCode::Refused | ResponseCode::NotAuth | ResponseCode::NotImp) => {
                    return Err(AxfrError::Refused(code.to_string()));
                }
                code => return Err(AxfrError::Protocol(format!("server returned {}", code))),
            }

            // An empty first answer is how some servers say no
            if response.answers().is_empty() && names.is_empty() {
                return Err(AxfrError::Refused("empty answer".into()));
            }

            for record in response.answers() {
                if record.record_type() == RecordType::SOA {
                    soa_seen += 1;
                }
                let owner = record.name().to_utf8();
                trace!("AXFR record {} {}", owner, record.record_type());
                names.push(owner);
            }

            // zone is framed by its SOA record
            if soa_seen >= 2 {
                return Ok(names);
            }
        }

        Err(AxfrError::Protocol("transfer did not terminate".into()))
    }
}

#[async_trait]
impl ZoneTransfer for AxfrClient {
    async fn transfer(
        &self,
        server: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, AxfrError> {
        debug!("Attempting AXFR of {} against {}", domain, server);

        let attempt = async {
            let mut stream = TcpStream::connect(server).await?;
            Self::run(&mut stream, domain).await
        };

        tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| AxfrError::Timeout)?
    }
}

/// Unpredictable message id, so spoofed replies are hard to match
fn query_id() -> u16 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::rr::rdata::{A, SOA};
    use hickory_resolver::proto::rr::{RData, Record};
    use tokio::net::TcpListener;

    fn soa(origin: &Name) -> Record {
        let rdata = SOA::new(
            Name::from_ascii("ns1.example.com.").unwrap(),
            Name::from_ascii("admin.example.com.").unwrap(),
            1,
            3600,
            600,
            86400,
            300,
        );
        Record::from_rdata(origin.clone(), 300, RData::SOA(rdata))
    }

    fn a(name: &str) -> Record {
        Record::from_rdata(
            Name::from_ascii(name).unwrap(),
            300,
            RData::A(A::new(10, 0, 0, 1)),
        )
    }

    /// One-shot AXFR server replying with `answers`/`code`
    async fn serve_once(answers: Vec<Record>, code: ResponseCode) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await.unwrap();
            let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
            stream.read_exact(&mut buf).await.unwrap();
            let query = Message::from_vec(&buf).unwrap();

            let mut response = Message::new();
            response
                .set_id(query.id())
                .set_message_type(MessageType::Response)
                .set_op_code(OpCode::Query)
                .set_response_code(code);
            response.add_answers(answers);

            let bytes = response.to_vec().unwrap();
            stream
                .write_all(&(bytes.len() as u16).to_be_bytes())
                .await
                .unwrap();
            stream.write_all(&bytes).await.unwrap();
            stream.flush().await.unwrap();
        });

        addr
    }

    #[test]
    fn test_query_ids_vary() {
        let ids: std::collections::HashSet<u16> = (0..64).map(|_| query_id()).collect();
        assert!(ids.len() > 32, "only {} distinct ids", ids.len());
    }

    #[test]
    fn test_build_query_is_axfr() {
        let bytes = AxfrClient::build_query("example.com", 42).unwrap();
        let message = Message::from_vec(&bytes).unwrap();

        assert_eq!(message.id(), 42);
        assert_eq!(message.queries().len(), 1);
        assert_eq!(message.queries()[0].query_type(), RecordType::AXFR);
        assert_eq!(message.queries()[0].name().to_utf8(), "example.com.");
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let origin = Name::from_ascii("example.com.").unwrap();
        let answers = vec![
            soa(&origin),
            a("www.example.com."),
            a("vpn.example.com."),
            soa(&origin),
        ];
        let addr = serve_once(answers, ResponseCode::NoError).await;

        let names = AxfrClient::new()
            .transfer(addr, "example.com", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(names.contains(&"www.example.com.".to_string()));
        assert!(names.contains(&"vpn.example.com.".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_refused_transfer() {
        let addr = serve_once(vec![], ResponseCode::Refused).await;

        let err = AxfrClient::new()
            .transfer(addr, "example.com", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.is_refusal());
    }

    #[tokio::test]
    async fn test_connection_refused_is_io_error() {
        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = AxfrClient::new()
            .transfer(addr, "example.com", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, AxfrError::Io(_)));
        assert!(!err.is_refusal());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = AxfrClient::new()
            .transfer(addr, "example.com", Duration::from_millis(200))
            .await
            .unwrap_err();

        assert_eq!(err, AxfrError::Timeout);
    }
}
