mod test_batching;
mod test_domain;
