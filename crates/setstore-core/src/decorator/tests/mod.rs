mod stringify_tests;
