pub mod ext;
pub mod props;
