mod crawl_tests;
mod http_tests;
mod support;
