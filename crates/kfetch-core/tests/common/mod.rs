pub mod dataset_server;
