mod test_transport;
