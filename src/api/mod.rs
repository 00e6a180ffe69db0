// JSON view of translated graphs.

pub mod dto;
