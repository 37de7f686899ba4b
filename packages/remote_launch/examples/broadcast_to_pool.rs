//! Broadcasts one job to a small pool of worker threads, runs a share of it
//! on the control thread, and reaps every result.

use new_zealand::nz;
use remote_launch::{JobDispatcher, spawn_workers};

fn main() {
    // Eight slots; the last identifier is reserved for the control thread.
    let control_id = 7;

    let (dispatcher, workers) = JobDispatcher::new(nz!(8), control_id);

    // In a real dataplane runtime each of these threads would be pinned to
    // its own processor; see `spawn_workers_with()` for the hook to do that.
    let threads = spawn_workers(workers);

    dispatcher
        .launch_all(
            |id| {
                println!("slot {id}: executing its share of the broadcast");
                i32::try_from(id).expect("pool is small") * 100
            },
            true,
        )
        .expect("a freshly constructed pool is idle");

    // Rendezvous: after this, no worker is mid-job.
    dispatcher.wait_all();

    for id in dispatcher.worker_ids() {
        println!("slot {id} produced {}", dispatcher.wait(id));
    }

    // The control share already ran inline during launch_all().
    println!(
        "control slot {control_id} produced {}",
        dispatcher.wait(control_id)
    );

    drop(dispatcher);

    for thread in threads {
        thread.join().expect("worker thread never panics");
    }
}
