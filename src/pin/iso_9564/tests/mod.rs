mod test_format_4;
