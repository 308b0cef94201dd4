mod test_opt_block;
mod test_tr31;
