//! Builtin command sets used by the filter policy.

/// Commands denied in blocklist mode
pub const DANGEROUS_COMMANDS: &[&str] = &[
    // Data destruction
    "FLUSHALL",
    "FLUSHDB",
    "SWAPDB",
    // Server reconfiguration
    "CONFIG",
    "ACL",
    // Scripting and code execution
    "EVAL",
    "EVALSHA",
    "EVAL_RO",
    "EVALSHA_RO",
    "SCRIPT",
    "FUNCTION",
    "FCALL",
    "FCALL_RO",
    // Module loading
    "MODULE",
    // Server control
    "SHUTDOWN",
    "DEBUG",
    "SAVE",
    "BGSAVE",
    "BGREWRITEAOF",
    "MONITOR",
    "FAILOVER",
    "LATENCY",
    "MEMORY",
    // Replication and exfiltration
    "SLAVEOF",
    "REPLICAOF",
    "SYNC",
    "PSYNC",
    "MIGRATE",
    "DUMP",
    "RESTORE",
    // Cluster and client manipulation
    "CLUSTER",
    "CLIENT",
    "READONLY",
    "READWRITE",
    // Unbounded key enumeration
    "KEYS",
];

/// Commands permitted in allowlist mode
pub const SAFE_COMMANDS: &[&str] = &[
    // Strings
    "GET", "SET", "SETNX", "SETEX", "PSETEX", "GETSET", "GETDEL", "GETEX", "GETRANGE",
    "SETRANGE", "MGET", "MSET", "MSETNX", "APPEND", "STRLEN", "INCR", "INCRBY",
    "INCRBYFLOAT", "DECR", "DECRBY", "LCS",
    // Keys
    "DEL", "UNLINK", "EXISTS", "EXPIRE", "EXPIREAT", "PEXPIRE", "PEXPIREAT", "EXPIRETIME",
    "PEXPIRETIME", "TTL", "PTTL", "PERSIST", "TYPE", "RENAME", "RENAMENX", "TOUCH", "SCAN",
    "COPY", "RANDOMKEY",
    // Hashes
    "HGET", "HSET", "HSETNX", "HMGET", "HMSET", "HDEL", "HEXISTS", "HGETALL", "HKEYS",
    "HVALS", "HLEN", "HINCRBY", "HINCRBYFLOAT", "HSTRLEN", "HSCAN", "HRANDFIELD",
    // Lists
    "LPUSH", "RPUSH", "LPUSHX", "RPUSHX", "LPOP", "RPOP", "LLEN", "LRANGE", "LINDEX",
    "LSET", "LREM", "LTRIM", "LINSERT", "LPOS", "LMOVE", "RPOPLPUSH", "LMPOP",
    // Sets
    "SADD", "SREM", "SMEMBERS", "SISMEMBER", "SMISMEMBER", "SCARD", "SPOP",
    "SRANDMEMBER", "SINTER", "SINTERCARD", "SINTERSTORE", "SUNION", "SUNIONSTORE",
    "SDIFF", "SDIFFSTORE", "SMOVE", "SSCAN",
    // Sorted sets
    "ZADD", "ZREM", "ZSCORE", "ZMSCORE", "ZINCRBY", "ZCARD", "ZCOUNT", "ZLEXCOUNT",
    "ZRANGE", "ZRANGEBYSCORE", "ZRANGEBYLEX", "ZREVRANGE", "ZREVRANGEBYSCORE",
    "ZREVRANGEBYLEX", "ZRANK", "ZREVRANK", "ZPOPMIN", "ZPOPMAX", "ZRANGESTORE",
    "ZREMRANGEBYRANK", "ZREMRANGEBYSCORE", "ZREMRANGEBYLEX", "ZUNION", "ZUNIONSTORE",
    "ZINTER", "ZINTERSTORE", "ZINTERCARD", "ZDIFF", "ZDIFFSTORE", "ZRANDMEMBER",
    "ZSCAN", "ZMPOP",
    // Streams
    "XADD", "XRANGE", "XREVRANGE", "XLEN", "XREAD", "XDEL", "XTRIM", "XGROUP",
    "XREADGROUP", "XACK", "XPENDING", "XCLAIM", "XAUTOCLAIM", "XINFO",
    // Geo
    "GEOADD", "GEODIST", "GEOHASH", "GEOPOS", "GEOSEARCH", "GEOSEARCHSTORE",
    "GEORADIUS_RO", "GEORADIUSBYMEMBER_RO",
    // Bitmaps
    "SETBIT", "GETBIT", "BITCOUNT", "BITPOS", "BITOP", "BITFIELD", "BITFIELD_RO",
    // HyperLogLog
    "PFADD", "PFCOUNT", "PFMERGE",
    // JSON extension
    "JSON.GET", "JSON.SET", "JSON.DEL", "JSON.FORGET", "JSON.MGET", "JSON.MSET",
    "JSON.TYPE", "JSON.STRLEN", "JSON.STRAPPEND", "JSON.NUMINCRBY", "JSON.NUMMULTBY",
    "JSON.ARRAPPEND", "JSON.ARRINDEX", "JSON.ARRINSERT", "JSON.ARRLEN", "JSON.ARRPOP",
    "JSON.ARRTRIM", "JSON.OBJKEYS", "JSON.OBJLEN", "JSON.TOGGLE", "JSON.CLEAR",
    "JSON.MERGE", "JSON.RESP",
    // Read-only server info
    "PING", "ECHO", "TIME", "DBSIZE", "INFO", "LASTSAVE", "COMMAND",
    // Transaction control
    "MULTI", "EXEC", "DISCARD", "WATCH", "UNWATCH",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_are_uppercase_and_disjoint() {
        for name in DANGEROUS_COMMANDS.iter().chain(SAFE_COMMANDS) {
            assert_eq!(*name, name.to_uppercase());
        }
        for name in DANGEROUS_COMMANDS {
            assert!(!SAFE_COMMANDS.contains(name), "{} is in both sets", name);
        }
    }
}
