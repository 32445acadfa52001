mod uppercase_first_name;
