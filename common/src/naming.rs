//! File names shared by the map side, the reduce side and the partition merge.

/// Intermediate file written by map task `map_task` for partition `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: usize, reduce_task: usize) -> String {
    format!("mrtmp.{job_name}-{map_task}-{reduce_task}")
}

/// Output of partition `reduce_task`, picked up by the merge step.
pub fn merge_name(job_name: &str, reduce_task: usize) -> String {
    format!("mrtmp.{job_name}-res-{reduce_task}")
}
