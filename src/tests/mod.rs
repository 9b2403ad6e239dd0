mod membership_tests;
