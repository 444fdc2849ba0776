mod blockscout_tests;
mod twitter_tests;
