mod support;

mod report_line;
mod topologies;
