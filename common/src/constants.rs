pub const ZFS: &str = "/usr/sbin/zfs";
