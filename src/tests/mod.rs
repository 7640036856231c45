mod test_generation;
