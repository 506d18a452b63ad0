//! Subset of the EigenDA v1 `disperser.Disperser` service. Fields the gateway
//! never reads are left out; prost skips them when decoding.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisperseBlobRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    #[prost(uint32, repeated, tag = "2")]
    pub custom_quorum_numbers: Vec<u32>,
    #[prost(string, tag = "3")]
    pub account_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisperseBlobReply {
    #[prost(enumeration = "BlobStatus", tag = "1")]
    pub result: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub request_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobStatusRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub request_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobStatusReply {
    #[prost(enumeration = "BlobStatus", tag = "1")]
    pub status: i32,
    #[prost(message, optional, tag = "2")]
    pub info: Option<BlobInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobInfo {
    #[prost(message, optional, tag = "2")]
    pub blob_verification_proof: Option<BlobVerificationProof>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobVerificationProof {
    #[prost(uint32, tag = "1")]
    pub batch_id: u32,
    #[prost(uint32, tag = "2")]
    pub blob_index: u32,
    #[prost(message, optional, tag = "3")]
    pub batch_metadata: Option<BatchMetadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchMetadata {
    #[prost(bytes = "vec", tag = "5")]
    pub batch_header_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetrieveBlobRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub batch_header_hash: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub blob_index: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetrieveBlobReply {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BlobStatus {
    Unknown = 0,
    Processing = 1,
    Confirmed = 2,
    Failed = 3,
    Finalized = 4,
    InsufficientSignatures = 5,
    Dispersing = 6,
}

pub mod disperser_client {
    use tonic::codegen::{http::uri::PathAndQuery, *};

    const SERVICE: &str = "disperser.Disperser";

    #[derive(Debug, Clone)]
    pub struct DisperserClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl<T> DisperserClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self {
                inner: tonic::client::Grpc::new(inner),
            }
        }

        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        async fn unary<Req, Reply>(
            &mut self,
            method: &'static str,
            path: &'static str,
            request: impl tonic::IntoRequest<Req>,
        ) -> Result<tonic::Response<Reply>, tonic::Status>
        where
            Req: prost::Message + Send + Sync + 'static,
            Reply: prost::Message + Default + Send + Sync + 'static,
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;

            let codec = tonic::codec::ProstCodec::default();
            let mut request = request.into_request();
            request
                .extensions_mut()
                .insert(GrpcMethod::new(SERVICE, method));

            self.inner
                .unary(request, PathAndQuery::from_static(path), codec)
                .await
        }

        pub async fn disperse_blob(
            &mut self,
            request: impl tonic::IntoRequest<super::DisperseBlobRequest>,
        ) -> Result<tonic::Response<super::DisperseBlobReply>, tonic::Status> {
            self.unary(
                "DisperseBlob",
                "/disperser.Disperser/DisperseBlob",
                request,
            )
            .await
        }

        pub async fn get_blob_status(
            &mut self,
            request: impl tonic::IntoRequest<super::BlobStatusRequest>,
        ) -> Result<tonic::Response<super::BlobStatusReply>, tonic::Status> {
            self.unary(
                "GetBlobStatus",
                "/disperser.Disperser/GetBlobStatus",
                request,
            )
            .await
        }

        pub async fn retrieve_blob(
            &mut self,
            request: impl tonic::IntoRequest<super::RetrieveBlobRequest>,
        ) -> Result<tonic::Response<super::RetrieveBlobReply>, tonic::Status> {
            self.unary(
                "RetrieveBlob",
                "/disperser.Disperser/RetrieveBlob",
                request,
            )
            .await
        }
    }
}
