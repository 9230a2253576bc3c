pub mod abi;
pub mod lookup;
pub mod parser;
