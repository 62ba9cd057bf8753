use std::ops::{Deref, DerefMut};

/// N rotating storage regions for per-frame generated data, so the frame
/// being built never writes into storage the GPU is still reading.
///
/// The pool never waits: the caller's synchronization collaborator performs
/// the fence wait and reports it through [`FrameRegionPool::mark_consumed`]
/// before the region comes up for reuse. Acquiring a region that is still
/// in flight is a synchronization defect and halts immediately rather than
/// corrupting a frame that is being consumed.
#[derive(Debug)]
pub struct FrameRegionPool<T> {
    regions: Vec<Region<T>>,
}

#[derive(Debug)]
struct Region<T> {
    storage: T,
    last_written_frame: Option<u64>,
    in_flight: bool,
}

impl<T: Default> FrameRegionPool<T> {
    pub fn new(overlap: usize) -> FrameRegionPool<T> {
        assert!(overlap >= 1, "frame overlap must be at least 1");
        FrameRegionPool {
            regions: (0..overlap)
                .map(|_| Region {
                    storage: T::default(),
                    last_written_frame: None,
                    in_flight: false,
                })
                .collect(),
        }
    }
}

impl<T> FrameRegionPool<T> {
    pub fn overlap(&self) -> usize {
        self.regions.len()
    }

    /// Leases the region for `frame_index` for writing. The external fence
    /// wait and [`mark_consumed`](Self::mark_consumed) call for this
    /// region's previous contents must have happened already.
    pub fn acquire(&mut self, frame_index: u64) -> RegionLease<'_, T> {
        let overlap = self.regions.len();
        let region = &mut self.regions[frame_index as usize % overlap];

        if region.in_flight {
            panic!(
                "frame region for frame {frame_index} still holds frame {:?} that was never \
                 signalled as consumed",
                region.last_written_frame
            );
        }

        RegionLease {
            region,
            frame_index,
        }
    }

    /// Signal from the synchronization collaborator that the GPU finished
    /// consuming the region written for `frame_index`.
    pub fn mark_consumed(&mut self, frame_index: u64) {
        let overlap = self.regions.len();
        let region = &mut self.regions[frame_index as usize % overlap];
        debug_assert_eq!(region.last_written_frame, Some(frame_index));
        region.in_flight = false;
    }

    /// Read access for the consumer handing the region off.
    pub fn get(&self, frame_index: u64) -> &T {
        &self.regions[frame_index as usize % self.regions.len()].storage
    }
}

/// Scoped write lease on one region. Dropping the lease — on any exit path —
/// marks the region as in flight for the leased frame.
#[derive(Debug)]
pub struct RegionLease<'a, T> {
    region: &'a mut Region<T>,
    frame_index: u64,
}

impl<T> Deref for RegionLease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.region.storage
    }
}

impl<T> DerefMut for RegionLease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.region.storage
    }
}

impl<T> Drop for RegionLease<'_, T> {
    fn drop(&mut self) {
        self.region.last_written_frame = Some(self.frame_index);
        self.region.in_flight = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_rotate_by_frame_index() {
        let mut pool: FrameRegionPool<Vec<u32>> = FrameRegionPool::new(2);

        {
            let mut lease = pool.acquire(0);
            lease.push(10);
        }
        {
            let mut lease = pool.acquire(1);
            lease.push(11);
        }

        assert_eq!(pool.get(0), &vec![10]);
        assert_eq!(pool.get(1), &vec![11]);
        // Frame 2 maps back onto frame 0's region.
        assert_eq!(pool.get(2), &vec![10]);
    }

    #[test]
    fn consumed_region_can_be_rewritten() {
        let mut pool: FrameRegionPool<Vec<u32>> = FrameRegionPool::new(2);

        {
            let mut lease = pool.acquire(0);
            lease.push(10);
        }
        pool.mark_consumed(0);

        {
            let mut lease = pool.acquire(2);
            lease.clear();
            lease.push(20);
        }
        assert_eq!(pool.get(2), &vec![20]);
    }

    #[test]
    #[should_panic]
    fn rewriting_an_unconsumed_region_is_fatal() {
        let mut pool: FrameRegionPool<Vec<u32>> = FrameRegionPool::new(2);

        {
            let mut lease = pool.acquire(0);
            lease.push(10);
        }
        // No mark_consumed(0): the GPU may still be reading this region.
        let _ = pool.acquire(2);
    }

    #[test]
    fn lease_marks_region_in_flight_on_every_exit_path() {
        let mut pool: FrameRegionPool<Vec<u32>> = FrameRegionPool::new(1);

        fn write_partially(pool: &mut FrameRegionPool<Vec<u32>>) {
            let mut lease = pool.acquire(0);
            lease.push(1);
            // Early return; the lease still releases.
        }
        write_partially(&mut pool);

        pool.mark_consumed(0);
        let lease = pool.acquire(1);
        assert_eq!(*lease, vec![1]);
    }

    #[test]
    fn overlap_of_one_round_trips() {
        let mut pool: FrameRegionPool<u32> = FrameRegionPool::new(1);
        {
            let mut lease = pool.acquire(7);
            *lease = 42;
        }
        pool.mark_consumed(7);
        assert_eq!(*pool.get(7), 42);
    }
}
