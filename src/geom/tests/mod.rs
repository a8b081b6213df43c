mod test_scaling_basic;
