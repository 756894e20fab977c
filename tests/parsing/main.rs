mod broken;
mod parser;
mod samples;
