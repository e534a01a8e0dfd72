//! Code generated from `proto/api.proto`.

tonic::include_proto!("api");
